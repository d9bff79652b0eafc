//! Storage providers
//!
//! A provider lists the objects under a prefix and opens object bodies as
//! byte streams. The download engine only talks to the [`Provider`] trait,
//! so new backends plug in without touching the worker pool.
//!
//! [`S3Provider`] serves AWS S3, DigitalOcean Spaces, Cloudflare R2 and MinIO.

mod s3;
mod types;

pub use s3::S3Provider;
pub use types::{Object, ObjectReader, ProviderKind};

use async_trait::async_trait;
use log::info;

use crate::config::ProviderConfig;
use crate::error::ProviderError;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Capability set the folder download engine needs from a storage backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Backend name used in log lines
    fn name(&self) -> &str;

    /// List every object under `prefix`, including directory markers.
    ///
    /// Pagination is resolved internally: one call returns the whole listing.
    async fn list_objects(&self, prefix: &str) -> ProviderResult<Vec<Object>>;

    /// Open the body of `key` as a stream.
    async fn download_object(&self, key: &str) -> ProviderResult<ObjectReader>;

    /// Fetch metadata (content type, user metadata) for a single object.
    async fn object_info(&self, key: &str) -> ProviderResult<Object>;

    /// Release provider-held resources. Calling it more than once is harmless.
    async fn close(&self) -> ProviderResult<()> {
        Ok(())
    }
}

/// Build the provider described by `config`.
pub fn create_provider(config: &ProviderConfig) -> ProviderResult<Box<dyn Provider>> {
    let kind: ProviderKind = config.provider_type.parse()?;
    info!(
        "provider_create: type={} bucket={} region={}",
        kind, config.bucket, config.region
    );
    match kind {
        ProviderKind::S3 | ProviderKind::DigitalOcean | ProviderKind::R2 | ProviderKind::Minio => {
            Ok(Box::new(S3Provider::new(kind, config)?))
        }
    }
}
