//! Folder download engine
//!
//! Mirrors every object under a key prefix onto local disk:
//! - One listing call, then a fixed pool of workers pulling from a shared job queue
//! - Streaming copies in fixed-size chunks, cancellable between chunks
//! - Deterministic key to path mapping (`path`)
//! - One progress event per object, aggregated into a [`DownloadResult`]
//! - Per-object failures never stop sibling downloads

mod aggregator;
mod engine;
mod path;
mod types;
mod worker;

pub use aggregator::ProgressCallback;
pub use engine::Downloader;
pub use path::{local_path, relative_path};
pub use types::{
    DownloadResult, DownloadSummary, DownloaderOptions, ProgressEvent, SummaryError,
    COPY_CHUNK_SIZE, DEFAULT_CONCURRENCY, WRITE_BUFFER_SIZE,
};
