//! Download worker - pulls jobs, streams each object to disk, reports one event per object

use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::path::local_path;
use super::types::{ProgressEvent, COPY_CHUNK_SIZE, WRITE_BUFFER_SIZE};
use crate::error::DownloadError;
use crate::providers::{Object, Provider};

/// Everything a worker needs besides its queues. Shared read-only.
pub(crate) struct WorkerContext {
    pub provider: Arc<dyn Provider>,
    pub prefix: String,
    pub root: PathBuf,
    pub cancel: CancellationToken,
    pub verify_size: bool,
}

/// Take jobs until the queue is closed and drained.
pub(crate) async fn run_worker(
    worker_id: usize,
    ctx: Arc<WorkerContext>,
    jobs: async_channel::Receiver<Object>,
    progress: mpsc::Sender<ProgressEvent>,
) {
    let mut processed = 0usize;
    while let Ok(object) = jobs.recv().await {
        let event = process_object(&ctx, &object).await;
        processed += 1;
        if progress.send(event).await.is_err() {
            warn!("download_worker: {} progress sink closed, stopping", worker_id);
            break;
        }
    }
    debug!("download_worker: {} finished after {} jobs", worker_id, processed);
}

pub(crate) async fn process_object(ctx: &WorkerContext, object: &Object) -> ProgressEvent {
    if ctx.cancel.is_cancelled() {
        return ProgressEvent::failed(
            &object.key,
            object.size,
            DownloadError::Cancelled {
                key: object.key.clone(),
            },
        );
    }

    if object.is_directory_marker() {
        return match create_directory_marker(ctx, object).await {
            Ok(()) => ProgressEvent::completed(&object.key, 0, 0),
            Err(e) => ProgressEvent::failed(&object.key, 0, e),
        };
    }

    match download_object(ctx, object).await {
        Ok(bytes) => {
            debug!("download_object: {} ({} bytes)", object.key, bytes);
            ProgressEvent::completed(&object.key, bytes, object.size)
        }
        Err(e) => {
            warn!("download_object: {} failed: {}", object.key, e);
            ProgressEvent::failed(&object.key, object.size, e)
        }
    }
}

async fn create_directory_marker(ctx: &WorkerContext, object: &Object) -> Result<(), DownloadError> {
    let path = local_path(&ctx.root, &object.key, &ctx.prefix)?;
    tokio::fs::create_dir_all(&path)
        .await
        .map_err(|source| DownloadError::CreateDirectory {
            key: object.key.clone(),
            path,
            source,
        })
}

/// Stream one object to its local path, returning the number of bytes written.
async fn download_object(ctx: &WorkerContext, object: &Object) -> Result<u64, DownloadError> {
    let key = object.key.as_str();
    let destination = local_path(&ctx.root, key, &ctx.prefix)?;

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| DownloadError::CreateDirectory {
                key: key.to_string(),
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let mut reader = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => {
            return Err(DownloadError::Cancelled { key: key.to_string() });
        }
        opened = ctx.provider.download_object(key) => opened.map_err(DownloadError::Fetch)?,
    };

    // File::create truncates, so a re-run fully overwrites earlier content.
    let file = File::create(&destination)
        .await
        .map_err(|source| DownloadError::CreateFile {
            key: key.to_string(),
            path: destination.clone(),
            source,
        })?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);

    let copied = copy_with_cancellation(&mut reader, &mut writer, &ctx.cancel).await;
    drop(writer);
    drop(reader);

    let result = match copied {
        Ok(bytes) if ctx.verify_size && bytes != object.size => Err(DownloadError::SizeMismatch {
            key: key.to_string(),
            expected: object.size,
            actual: bytes,
        }),
        Ok(bytes) => Ok(bytes),
        Err(CopyError::Read(source)) => Err(DownloadError::Stream {
            key: key.to_string(),
            source,
        }),
        Err(CopyError::Write(source)) => Err(DownloadError::Write {
            key: key.to_string(),
            path: destination.clone(),
            source,
        }),
        Err(CopyError::Cancelled) => Err(DownloadError::Cancelled {
            key: key.to_string(),
        }),
    };

    if result.is_err() {
        remove_partial_file(&destination).await;
    }
    result
}

async fn remove_partial_file(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("download_cleanup: failed to remove {}: {}", path.display(), e);
        }
    }
}

#[derive(Debug)]
pub(crate) enum CopyError {
    Read(io::Error),
    Write(io::Error),
    Cancelled,
}

/// Copy `reader` into `writer` in fixed-size chunks, checking `cancel`
/// before every read. The writer is flushed before returning success.
pub(crate) async fn copy_with_cancellation<R, W>(
    reader: &mut R,
    writer: &mut W,
    cancel: &CancellationToken,
) -> Result<u64, CopyError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buffer = vec![0u8; COPY_CHUNK_SIZE];
    let mut total: u64 = 0;

    loop {
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CopyError::Cancelled),
            read = reader.read(&mut buffer) => read.map_err(CopyError::Read)?,
        };
        if read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..read])
            .await
            .map_err(CopyError::Write)?;
        total += read as u64;
    }

    writer.flush().await.map_err(CopyError::Write)?;
    Ok(total)
}
