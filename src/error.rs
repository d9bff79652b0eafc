//! Error types for providers, per-object downloads, the folder engine and configuration.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::download::DownloadResult;

/// Errors raised by a storage provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Listing objects under a prefix failed (transport, auth, missing bucket)
    #[error("failed to list objects under '{prefix}': {message}")]
    List { prefix: String, message: String },

    /// The object body could not be opened
    #[error("failed to download object {key}: {message}")]
    Fetch { key: String, message: String },

    /// Object metadata could not be retrieved
    #[error("failed to get object info for {key}: {message}")]
    Head { key: String, message: String },

    #[error("unsupported provider type: {0}")]
    UnsupportedType(String),

    #[error("invalid provider configuration: {0}")]
    Config(String),
}

/// Failure of a single object transfer. Never fatal to the whole run.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("failed to create directory {} for {key}: {source}", path.display())]
    CreateDirectory {
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Fetch(ProviderError),

    #[error("failed to create local file {} for {key}: {source}", path.display())]
    CreateFile {
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write data to {} for {key}: {source}", path.display())]
    Write {
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read remote stream for {key}: {source}")]
    Stream {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("size mismatch for {key}: listed {expected} bytes, received {actual}")]
    SizeMismatch {
        key: String,
        expected: u64,
        actual: u64,
    },

    #[error("key {key} cannot be mapped under prefix '{prefix}'")]
    InvalidKey { key: String, prefix: String },

    #[error("download of {key} cancelled")]
    Cancelled { key: String },

    #[error("worker stopped before reporting {key}")]
    Aborted { key: String },
}

impl DownloadError {
    /// Short tag describing the failure class, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            DownloadError::CreateDirectory { .. } => "directory",
            DownloadError::Fetch(_) => "fetch",
            DownloadError::CreateFile { .. } | DownloadError::Write { .. } => "write",
            DownloadError::Stream { .. } => "stream",
            DownloadError::SizeMismatch { .. } => "size_mismatch",
            DownloadError::InvalidKey { .. } => "invalid_key",
            DownloadError::Cancelled { .. } => "cancelled",
            DownloadError::Aborted { .. } => "aborted",
        }
    }
}

/// Errors returned by [`Downloader::download_folder`](crate::download::Downloader::download_folder).
///
/// `List`, `CreateDestination` and `Cancelled` mean nothing was transferred.
/// `PartialFailure` means every job ran and carries the complete result.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to list objects: {0}")]
    List(#[source] ProviderError),

    #[error("failed to create local directory {}: {source}", path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("download cancelled before any transfer started")]
    Cancelled,

    #[error("download completed with {} errors", .0.errors.len())]
    PartialFailure(Box<DownloadResult>),
}

impl EngineError {
    /// The populated result when the run completed with per-object failures.
    pub fn result(&self) -> Option<&DownloadResult> {
        match self {
            EngineError::PartialFailure(result) => Some(result),
            _ => None,
        }
    }

    pub fn into_result(self) -> Option<DownloadResult> {
        match self {
            EngineError::PartialFailure(result) => Some(*result),
            _ => None,
        }
    }
}

/// Configuration loading and provider resolution errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("error reading config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error parsing config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no provider configured; pass --type and credentials or add one to the config file")]
    NoProvider,

    #[error("provider '{0}' is not configured")]
    UnknownProvider(String),

    #[error("several providers are configured ({0}); select one with --provider")]
    AmbiguousProvider(String),

    #[error("{0} not provided")]
    MissingField(&'static str),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
