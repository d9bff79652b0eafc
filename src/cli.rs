//! Command-line argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ProviderOverrides;
use crate::download::{DownloaderOptions, DEFAULT_CONCURRENCY};

/// Download files and folders from S3-compatible storage buckets.
///
/// Supports AWS S3, DigitalOcean Spaces, Cloudflare R2, MinIO and any other
/// S3-compatible service.
///
/// ## Examples
///
///   download-bucket clone --provider aws --bucket my-bucket data/ ./local-data
///
///   download-bucket clone --type digitalocean --region ams3 --bucket my-space images/ ./images
///
///   download-bucket providers
#[derive(Parser, Debug)]
#[command(name = "download-bucket")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (repeat for debug logs)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file path (default: ./config.toml, $HOME/.download-bucket/config.toml,
    /// /etc/download-bucket/config.toml)
    #[arg(long, global = true, env = "DOWNLOAD_BUCKET_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Clone a folder from cloud storage to a local directory
    Clone(CloneArgs),

    /// List configured providers
    Providers,
}

#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Key prefix to download (e.g. "photos/2020/")
    pub prefix: String,

    /// Local destination directory
    pub destination: PathBuf,

    /// Configured provider name (e.g. aws, digitalocean)
    #[arg(long)]
    pub provider: Option<String>,

    /// Provider type (s3, digitalocean, r2, minio)
    #[arg(long = "type")]
    pub provider_type: Option<String>,

    /// Bucket name (overrides config)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Region (overrides config)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom endpoint (overrides config)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Access key (overrides config)
    #[arg(long)]
    pub access_key: Option<String>,

    /// Secret key (overrides config)
    #[arg(long)]
    pub secret_key: Option<String>,

    /// Number of concurrent downloads (values of 0 or less select the default)
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY as i64, allow_negative_numbers = true)]
    pub concurrency: i64,

    /// Accept objects whose transferred size differs from the listed size
    #[arg(long)]
    pub no_verify_size: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl CloneArgs {
    pub fn overrides(&self) -> ProviderOverrides {
        ProviderOverrides {
            provider: self.provider.clone(),
            provider_type: self.provider_type.clone(),
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
        }
    }

    pub fn downloader_options(&self) -> DownloaderOptions {
        DownloaderOptions {
            // 0 tells the engine to use its default pool size
            concurrency: usize::try_from(self.concurrency).unwrap_or(0),
            verify_size: !self.no_verify_size,
        }
    }
}
