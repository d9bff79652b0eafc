//! Folder download engine - list, fan out to the worker pool, aggregate

use futures_util::future::join_all;
use log::{error, info};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::aggregator::{ProgressCallback, ResultAggregator};
use super::types::{DownloadResult, DownloaderOptions, ProgressEvent};
use super::worker::{run_worker, WorkerContext};
use crate::error::{EngineError, ProviderError};
use crate::providers::Provider;

/// Mirrors a bucket prefix onto local disk through a fixed-size worker pool.
pub struct Downloader {
    provider: Arc<dyn Provider>,
    options: DownloaderOptions,
    cancel: CancellationToken,
}

impl Downloader {
    pub fn new(provider: Arc<dyn Provider>, options: DownloaderOptions) -> Self {
        Self {
            provider,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops downloads on this instance: pending jobs are skipped
    /// and in-flight copies stop at their next chunk boundary.
    ///
    /// The token belongs to the `Downloader`, not to a single run. Once it is
    /// cancelled every later run returns [`EngineError::Cancelled`] before
    /// listing; build a new `Downloader` to start over.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn concurrency(&self) -> usize {
        self.options.effective_concurrency()
    }

    /// Download every object under `prefix` into `destination`.
    ///
    /// When some objects fail the whole listing is still attempted and the
    /// populated result comes back inside [`EngineError::PartialFailure`].
    pub async fn download_folder(
        &self,
        prefix: &str,
        destination: impl AsRef<Path>,
    ) -> Result<DownloadResult, EngineError> {
        self.run(prefix, destination.as_ref(), None).await
    }

    /// Same as [`download_folder`](Self::download_folder), invoking `progress`
    /// once per object in the order outcomes arrive.
    pub async fn download_folder_with_progress<F>(
        &self,
        prefix: &str,
        destination: impl AsRef<Path>,
        mut progress: F,
    ) -> Result<DownloadResult, EngineError>
    where
        F: FnMut(&ProgressEvent) + Send,
    {
        self.run(prefix, destination.as_ref(), Some(&mut progress))
            .await
    }

    async fn run(
        &self,
        prefix: &str,
        destination: &Path,
        callback: Option<ProgressCallback<'_>>,
    ) -> Result<DownloadResult, EngineError> {
        let start_time = Instant::now();

        info!(
            "download_folder: listing provider={} prefix={}",
            self.provider.name(),
            prefix
        );
        let objects = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(EngineError::Cancelled),
            listed = self.provider.list_objects(prefix) => listed.map_err(EngineError::List)?,
        };

        if objects.is_empty() {
            info!("download_folder: no objects under prefix={}", prefix);
            return Ok(DownloadResult {
                duration: start_time.elapsed(),
                ..Default::default()
            });
        }

        tokio::fs::create_dir_all(destination)
            .await
            .map_err(|source| EngineError::CreateDestination {
                path: destination.to_path_buf(),
                source,
            })?;

        let concurrency = self.options.effective_concurrency();
        info!(
            "download_folder: {} objects -> {} with {} workers",
            objects.len(),
            destination.display(),
            concurrency
        );

        // Both queues hold the whole listing, so neither side ever waits for room.
        let capacity = objects.len();
        let (job_tx, job_rx) = async_channel::bounded(capacity);
        let (progress_tx, progress_rx) = mpsc::channel::<ProgressEvent>(capacity);

        let ctx = Arc::new(WorkerContext {
            provider: Arc::clone(&self.provider),
            prefix: prefix.to_string(),
            root: destination.to_path_buf(),
            cancel: self.cancel.clone(),
            verify_size: self.options.verify_size,
        });

        let handles: Vec<_> = (0..concurrency)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&ctx),
                    job_rx.clone(),
                    progress_tx.clone(),
                ))
            })
            .collect();
        drop(job_rx);
        drop(progress_tx);

        let keys: Vec<String> = objects.iter().map(|o| o.key.clone()).collect();
        for object in objects {
            if job_tx.try_send(object).is_err() {
                // Only possible when every worker is gone; unreported keys fail below.
                error!("download_folder: job queue closed while enqueueing");
                break;
            }
        }
        job_tx.close();

        let mut aggregator = ResultAggregator::new(callback);
        aggregator.drain(progress_rx).await;

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!("download_worker: task failed: {}", e);
            }
        }
        aggregator.record_unreported(&keys);

        let mut result = aggregator.finish();
        result.duration = start_time.elapsed();

        info!(
            "download_folder: done files={} ok={} failed={} bytes={} duration={:?}",
            result.total_files,
            result.successful_files,
            result.failed_files,
            result.total_bytes,
            result.duration
        );

        if result.has_errors() {
            return Err(EngineError::PartialFailure(Box::new(result)));
        }
        Ok(result)
    }

    /// Release the provider.
    pub async fn close(&self) -> Result<(), ProviderError> {
        self.provider.close().await
    }
}
