//! Recursively mirror a folder (key prefix) from an S3-compatible bucket onto local disk.
//!
//! ```no_run
//! use std::sync::Arc;
//! use download_bucket::config::{Config, ProviderOverrides};
//! use download_bucket::download::{Downloader, DownloaderOptions};
//! use download_bucket::providers::create_provider;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let provider = create_provider(&config.resolve(&ProviderOverrides::default())?)?;
//! let downloader = Downloader::new(Arc::from(provider), DownloaderOptions::default());
//! let result = downloader.download_folder("photos/", "./photos").await?;
//! println!("{} files, {} bytes", result.successful_files, result.total_bytes);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod logging;
pub mod providers;

pub use download::{DownloadResult, Downloader, DownloaderOptions, ProgressEvent};
pub use error::{ConfigError, DownloadError, EngineError, ProviderError};
pub use providers::{create_provider, Object, Provider};
