//! S3-compatible provider backed by aws-sdk-s3

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use log::{debug, info};

use super::types::{Object, ObjectReader, ProviderKind};
use super::{Provider, ProviderResult};
use crate::config::ProviderConfig;
use crate::error::ProviderError;

/// Maximum keys requested per ListObjectsV2 page
const LIST_PAGE_SIZE: i32 = 1000;

pub struct S3Provider {
    client: Client,
    bucket: String,
    kind: ProviderKind,
}

impl S3Provider {
    pub fn new(kind: ProviderKind, config: &ProviderConfig) -> ProviderResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(ProviderError::Config("bucket name not provided".to_string()));
        }

        let region = if config.region.trim().is_empty() {
            kind.default_region().to_string()
        } else {
            config.region.clone()
        };
        let endpoint_url = resolve_endpoint_url(kind, config, &region)?;
        let force_path_style = config
            .force_path_style
            .unwrap_or(endpoint_url.is_some());

        debug!(
            "s3_provider: kind={} region={} endpoint={:?} path_style={}",
            kind, region, endpoint_url, force_path_style
        );

        let credentials = Credentials::new(
            config.access_key.as_str(),
            config.secret_key.as_str(),
            None,
            None,
            "download-bucket",
        );
        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region))
            .force_path_style(force_path_style);
        if let Some(endpoint_url) = &endpoint_url {
            builder = builder.endpoint_url(endpoint_url.as_str());
        }
        let client = Client::from_conf(builder.build());

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            kind,
        })
    }
}

#[async_trait]
impl Provider for S3Provider {
    fn name(&self) -> &str {
        match self.kind {
            ProviderKind::S3 => "s3",
            ProviderKind::DigitalOcean => "digitalocean",
            ProviderKind::R2 => "r2",
            ProviderKind::Minio => "minio",
        }
    }

    async fn list_objects(&self, prefix: &str) -> ProviderResult<Vec<Object>> {
        let mut all_objects: Vec<Object> = Vec::new();
        let mut continuation_token: Option<String> = None;
        let mut page_count = 0;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .max_keys(LIST_PAGE_SIZE);

            if !prefix.is_empty() {
                request = request.prefix(prefix);
            }
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| ProviderError::List {
                prefix: prefix.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
            page_count += 1;

            let objects = response.contents().iter().filter_map(|obj| {
                let key = obj.key()?.to_string();
                Some(Object {
                    key,
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: obj.last_modified().and_then(to_chrono),
                    etag: obj.e_tag().unwrap_or_default().to_string(),
                    ..Default::default()
                })
            });
            all_objects.extend(objects);

            if !response.is_truncated().unwrap_or(false) {
                break;
            }

            continuation_token = response.next_continuation_token().map(|s| s.to_string());
            if continuation_token.is_none() {
                break;
            }
        }

        info!(
            "s3_list: bucket={} prefix={} objects={} pages={}",
            self.bucket,
            prefix,
            all_objects.len(),
            page_count
        );
        Ok(all_objects)
    }

    async fn download_object(&self, key: &str) -> ProviderResult<ObjectReader> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ProviderError::Fetch {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(Box::new(Box::pin(output.body.into_async_read())))
    }

    async fn object_info(&self, key: &str) -> ProviderResult<Object> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ProviderError::Head {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(Object {
            key: key.to_string(),
            size: output.content_length().unwrap_or(0).max(0) as u64,
            last_modified: output.last_modified().and_then(to_chrono),
            etag: output.e_tag().unwrap_or_default().to_string(),
            content_type: output.content_type().map(|s| s.to_string()),
            metadata: output.metadata().cloned().unwrap_or_default(),
        })
    }

    async fn close(&self) -> ProviderResult<()> {
        // The SDK client holds no resources that need explicit release.
        debug!("s3_close: bucket={}", self.bucket);
        Ok(())
    }
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos())
}

/// Work out the endpoint URL for `kind`, `None` meaning the SDK default (AWS).
fn resolve_endpoint_url(
    kind: ProviderKind,
    config: &ProviderConfig,
    region: &str,
) -> ProviderResult<Option<String>> {
    if let Some(endpoint) = config.endpoint.as_deref().map(str::trim) {
        if !endpoint.is_empty() {
            return Ok(Some(with_scheme(endpoint)));
        }
    }

    match kind {
        ProviderKind::S3 => Ok(None),
        ProviderKind::DigitalOcean => {
            Ok(Some(format!("https://{}.digitaloceanspaces.com", region)))
        }
        ProviderKind::R2 => {
            let account_id = config
                .options
                .get("account_id")
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| {
                    ProviderError::Config("R2 requires an endpoint or options.account_id".into())
                })?;
            Ok(Some(format!(
                "https://{}.r2.cloudflarestorage.com",
                account_id.trim()
            )))
        }
        ProviderKind::Minio => Err(ProviderError::Config(
            "MinIO endpoint is required".to_string(),
        )),
    }
}

fn with_scheme(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", endpoint.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(provider_type: &str) -> ProviderConfig {
        ProviderConfig {
            provider_type: provider_type.to_string(),
            access_key: "AKIAEXAMPLE".to_string(),
            secret_key: "secret".to_string(),
            bucket: "bucket".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn aws_uses_sdk_default_endpoint() {
        let endpoint = resolve_endpoint_url(ProviderKind::S3, &config("s3"), "eu-west-1").unwrap();
        assert_eq!(endpoint, None);
    }

    #[test]
    fn spaces_endpoint_follows_region() {
        let endpoint =
            resolve_endpoint_url(ProviderKind::DigitalOcean, &config("digitalocean"), "ams3")
                .unwrap();
        assert_eq!(
            endpoint.as_deref(),
            Some("https://ams3.digitaloceanspaces.com")
        );
    }

    #[test]
    fn explicit_endpoint_gets_https_scheme() {
        let mut cfg = config("minio");
        cfg.endpoint = Some("minio.local:9000/".to_string());
        let endpoint = resolve_endpoint_url(ProviderKind::Minio, &cfg, "us-east-1").unwrap();
        assert_eq!(endpoint.as_deref(), Some("https://minio.local:9000"));

        cfg.endpoint = Some("http://127.0.0.1:9000".to_string());
        let endpoint = resolve_endpoint_url(ProviderKind::Minio, &cfg, "us-east-1").unwrap();
        assert_eq!(endpoint.as_deref(), Some("http://127.0.0.1:9000"));
    }

    #[test]
    fn r2_endpoint_needs_account_id() {
        let mut cfg = config("r2");
        assert!(resolve_endpoint_url(ProviderKind::R2, &cfg, "auto").is_err());

        cfg.options = HashMap::from([("account_id".to_string(), "abc123".to_string())]);
        let endpoint = resolve_endpoint_url(ProviderKind::R2, &cfg, "auto").unwrap();
        assert_eq!(
            endpoint.as_deref(),
            Some("https://abc123.r2.cloudflarestorage.com")
        );
    }

    #[test]
    fn minio_without_endpoint_is_rejected() {
        let err = resolve_endpoint_url(ProviderKind::Minio, &config("minio"), "us-east-1")
            .unwrap_err();
        assert!(err.to_string().contains("MinIO endpoint is required"));
    }

    #[tokio::test]
    async fn provider_requires_bucket() {
        let mut cfg = config("s3");
        cfg.bucket.clear();
        assert!(S3Provider::new(ProviderKind::S3, &cfg).is_err());
    }

    #[tokio::test]
    async fn provider_name_follows_kind() {
        let provider = S3Provider::new(ProviderKind::DigitalOcean, &config("digitalocean")).unwrap();
        assert_eq!(provider.name(), "digitalocean");
    }

    #[test]
    fn sdk_timestamps_convert_to_utc() {
        let dt = aws_sdk_s3::primitives::DateTime::from_secs(1_700_000_000);
        let converted = to_chrono(&dt).unwrap();
        assert_eq!(converted.timestamp(), 1_700_000_000);
    }
}
