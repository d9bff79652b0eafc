//! Provider configuration: file discovery, environment fallback and CLI overrides
//!
//! The config file is TOML:
//!
//! ```toml
//! [providers.aws]
//! type = "s3"
//! region = "eu-west-1"
//! access_key = "AKIA..."
//! secret_key = "..."
//! bucket = "my-bucket"
//!
//! [providers.spaces]
//! type = "digitalocean"
//! region = "nyc3"
//! access_key = "..."
//! secret_key = "..."
//! ```

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::providers::ProviderKind;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const CONFIG_DIR_NAME: &str = ".download-bucket";
pub const SYSTEM_CONFIG_DIR: &str = "/etc/download-bucket";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

/// Connection settings for one storage provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// "s3", "digitalocean", "r2" or "minio"
    #[serde(rename = "type", default)]
    pub provider_type: String,
    #[serde(default)]
    pub region: String,
    /// Custom endpoint for S3-compatible services
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub force_path_style: Option<bool>,
    /// Provider-specific extras (e.g. `account_id` for R2)
    #[serde(default)]
    pub options: HashMap<String, String>,
}

/// Values given on the command line, each one overriding the config file
#[derive(Debug, Clone, Default)]
pub struct ProviderOverrides {
    pub provider: Option<String>,
    pub provider_type: Option<String>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl Config {
    /// Load the config file (explicit path or first found in the search paths),
    /// falling back to environment variables when it defines no provider.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_search_paths().into_iter().find(|p| p.is_file()),
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("config_load: no config file found");
                Config::default()
            }
        };

        if config.providers.is_empty() {
            config.apply_env(|name| std::env::var(name).ok());
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "config_load: path={} providers={}",
            path.display(),
            config.providers.len()
        );
        Ok(config)
    }

    /// Add the `aws` and `digitalocean` providers described by the usual
    /// credential variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(access_key) = var("AWS_ACCESS_KEY_ID") {
            self.providers.insert(
                "aws".to_string(),
                ProviderConfig {
                    provider_type: ProviderKind::S3.to_string(),
                    region: var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                    access_key,
                    secret_key: var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
                    bucket: var("AWS_BUCKET").unwrap_or_default(),
                    ..Default::default()
                },
            );
        }

        if let Some(access_key) = var("DO_ACCESS_KEY_ID") {
            let region = var("DO_REGION").unwrap_or_else(|| "nyc3".to_string());
            self.providers.insert(
                "digitalocean".to_string(),
                ProviderConfig {
                    provider_type: ProviderKind::DigitalOcean.to_string(),
                    endpoint: Some(format!("https://{}.digitaloceanspaces.com", region)),
                    region,
                    access_key,
                    secret_key: var("DO_SECRET_ACCESS_KEY").unwrap_or_default(),
                    bucket: var("DO_BUCKET").unwrap_or_default(),
                    ..Default::default()
                },
            );
        }
    }

    /// Pick the provider to use and merge the command-line overrides into it.
    pub fn resolve(&self, overrides: &ProviderOverrides) -> Result<ProviderConfig, ConfigError> {
        let requested_kind = overrides
            .provider_type
            .as_deref()
            .map(str::parse::<ProviderKind>)
            .transpose()?;

        let mut provider = match overrides.provider.as_deref() {
            Some(name) => match self.providers.get(name) {
                Some(found) => found.clone(),
                None => {
                    // `--provider aws` with everything else on the command line
                    let kind = match requested_kind {
                        Some(kind) => kind,
                        None => name
                            .parse::<ProviderKind>()
                            .map_err(|_| ConfigError::UnknownProvider(name.to_string()))?,
                    };
                    ProviderConfig {
                        provider_type: kind.to_string(),
                        ..Default::default()
                    }
                }
            },
            None => self.select_unnamed(requested_kind, overrides)?,
        };

        if let Some(kind) = requested_kind {
            provider.provider_type = kind.to_string();
        }
        if provider.provider_type.trim().is_empty() {
            provider.provider_type = ProviderKind::S3.to_string();
        }
        let kind: ProviderKind = provider.provider_type.parse()?;
        provider.provider_type = kind.to_string();

        if let Some(v) = non_empty(&overrides.access_key) {
            provider.access_key = v;
        }
        if let Some(v) = non_empty(&overrides.secret_key) {
            provider.secret_key = v;
        }
        if let Some(v) = non_empty(&overrides.region) {
            provider.region = v;
        }
        if let Some(v) = non_empty(&overrides.endpoint) {
            provider.endpoint = Some(v);
        }
        if let Some(v) = non_empty(&overrides.bucket) {
            provider.bucket = v;
        }
        if provider.region.is_empty() {
            provider.region = kind.default_region().to_string();
        }

        if provider.access_key.is_empty() {
            return Err(ConfigError::MissingField("access key"));
        }
        if provider.secret_key.is_empty() {
            return Err(ConfigError::MissingField("secret key"));
        }
        if provider.bucket.is_empty() {
            return Err(ConfigError::MissingField("bucket name"));
        }

        Ok(provider)
    }

    fn select_unnamed(
        &self,
        requested_kind: Option<ProviderKind>,
        overrides: &ProviderOverrides,
    ) -> Result<ProviderConfig, ConfigError> {
        if let Some(kind) = requested_kind {
            let matching = self.providers.values().find(|p| {
                p.provider_type
                    .parse::<ProviderKind>()
                    .map(|k| k == kind)
                    .unwrap_or(false)
            });
            return Ok(matching.cloned().unwrap_or_else(|| ProviderConfig {
                provider_type: kind.to_string(),
                ..Default::default()
            }));
        }

        match self.providers.len() {
            0 if overrides.access_key.is_some() => Ok(ProviderConfig::default()),
            0 => Err(ConfigError::NoProvider),
            1 => Ok(self.providers.values().next().cloned().unwrap_or_default()),
            _ => Err(ConfigError::AmbiguousProvider(
                self.providers.keys().cloned().collect::<Vec<_>>().join(", "),
            )),
        }
    }
}

/// Config file locations, in lookup order.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(SYSTEM_CONFIG_DIR).join(CONFIG_FILE_NAME));
    paths
}

/// Hide all but the first characters of a secret for display.
pub fn mask_key(key: &str) -> String {
    if key.chars().count() <= 8 {
        return "***".to_string();
    }
    let visible: String = key.chars().take(4).collect();
    format!("{}***", visible)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}
