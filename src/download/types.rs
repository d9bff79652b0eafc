//! Download event types and run summary

use serde::Serialize;
use std::time::Duration;

use crate::error::DownloadError;

/// Workers started when the configured concurrency is zero
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Chunk size for the remote-to-local copy loop (64 KiB)
pub const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Write buffer size for local files (2 MB) - reduces I/O operations
pub const WRITE_BUFFER_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloaderOptions {
    /// Number of parallel workers; 0 selects [`DEFAULT_CONCURRENCY`]
    pub concurrency: usize,
    /// Fail an object whose copied byte count differs from its listed size
    pub verify_size: bool,
}

impl Default for DownloaderOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            verify_size: true,
        }
    }
}

impl DownloaderOptions {
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency == 0 {
            DEFAULT_CONCURRENCY
        } else {
            self.concurrency
        }
    }
}

/// Outcome of one object, emitted exactly once by the worker that processed it
#[derive(Debug)]
pub struct ProgressEvent {
    pub key: String,
    pub bytes_downloaded: u64,
    pub total_bytes: u64,
    pub error: Option<DownloadError>,
    pub completed: bool,
}

impl ProgressEvent {
    pub(crate) fn completed(key: impl Into<String>, bytes: u64, total_bytes: u64) -> Self {
        Self {
            key: key.into(),
            bytes_downloaded: bytes,
            total_bytes,
            error: None,
            completed: true,
        }
    }

    pub(crate) fn failed(key: impl Into<String>, total_bytes: u64, error: DownloadError) -> Self {
        Self {
            key: key.into(),
            bytes_downloaded: 0,
            total_bytes,
            error: Some(error),
            completed: false,
        }
    }
}

/// Summary of a folder download
#[derive(Debug, Default)]
pub struct DownloadResult {
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    pub total_bytes: u64,
    pub duration: Duration,
    /// Per-object failures, in the order the aggregator received them
    pub errors: Vec<DownloadError>,
}

impl DownloadResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Serializable view for machine-readable output
    pub fn summary(&self) -> DownloadSummary {
        DownloadSummary {
            total_files: self.total_files,
            successful_files: self.successful_files,
            failed_files: self.failed_files,
            total_bytes: self.total_bytes,
            duration_ms: self.duration.as_millis() as u64,
            errors: self
                .errors
                .iter()
                .map(|e| SummaryError {
                    kind: e.kind(),
                    message: e.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadSummary {
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    pub total_bytes: u64,
    pub duration_ms: u64,
    pub errors: Vec<SummaryError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryError {
    pub kind: &'static str,
    pub message: String,
}
