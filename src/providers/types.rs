//! Provider-neutral object and provider type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::io::AsyncRead;

use crate::error::ProviderError;

/// Readable object body handed to the download worker
pub type ObjectReader = Box<dyn AsyncRead + Unpin + Send>;

/// One entry of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: String,
    pub content_type: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Object {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            ..Default::default()
        }
    }

    /// Zero-content entry standing for a folder (`photos/2020/`)
    pub fn is_directory_marker(&self) -> bool {
        self.key.ends_with('/')
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProviderKind {
    #[serde(rename = "s3")]
    S3,
    #[serde(rename = "digitalocean")]
    DigitalOcean,
    #[serde(rename = "r2")]
    R2,
    #[serde(rename = "minio")]
    Minio,
}

impl ProviderKind {
    /// Region used when none is configured
    pub fn default_region(&self) -> &'static str {
        match self {
            ProviderKind::S3 | ProviderKind::Minio => "us-east-1",
            ProviderKind::DigitalOcean => "nyc3",
            ProviderKind::R2 => "auto",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::S3 => write!(f, "s3"),
            ProviderKind::DigitalOcean => write!(f, "digitalocean"),
            ProviderKind::R2 => write!(f, "r2"),
            ProviderKind::Minio => write!(f, "minio"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s3" | "aws" => Ok(ProviderKind::S3),
            "digitalocean" | "do" | "spaces" => Ok(ProviderKind::DigitalOcean),
            "r2" | "cloudflare" => Ok(ProviderKind::R2),
            "minio" => Ok(ProviderKind::Minio),
            other => Err(ProviderError::UnsupportedType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Object, ProviderKind};

    #[test]
    fn provider_kind_display_matches_expected_strings() {
        assert_eq!(ProviderKind::S3.to_string(), "s3");
        assert_eq!(ProviderKind::DigitalOcean.to_string(), "digitalocean");
        assert_eq!(ProviderKind::R2.to_string(), "r2");
        assert_eq!(ProviderKind::Minio.to_string(), "minio");
    }

    #[test]
    fn provider_kind_accepts_aliases() {
        assert_eq!("aws".parse::<ProviderKind>().unwrap(), ProviderKind::S3);
        assert_eq!(
            "Spaces".parse::<ProviderKind>().unwrap(),
            ProviderKind::DigitalOcean
        );
        assert_eq!("do".parse::<ProviderKind>().unwrap(), ProviderKind::DigitalOcean);
    }

    #[test]
    fn provider_kind_rejects_unknown_type() {
        let err = "gcs".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported provider type: gcs");
    }

    #[test]
    fn directory_marker_is_detected_by_trailing_slash() {
        assert!(Object::new("photos/2020/", 0).is_directory_marker());
        assert!(!Object::new("photos/2020/a.jpg", 12).is_directory_marker());
    }
}
