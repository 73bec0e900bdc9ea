use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::{BlobConfig, BlobError, BlobId, BlobResult};

const CHUNK_FILE_EXT: &str = "tmp";

/// Local disk buffer reconciling small write chunks with a backend's
/// minimum multipart part size.
///
/// Each in-flight blob id owns one append-only buffer file under the
/// configured temp directory. Buffers are flushed and deleted by the
/// write path once the flush threshold is reached; buffers abandoned by
/// crashed or aborted sessions are reclaimed by a periodic sweep that
/// deletes any file untouched for longer than the write timeout. The
/// sweep is a best-effort safety net, not a correctness mechanism.
pub struct TempChunkStorage {
    path: PathBuf,
    max_blob_size: u64,
    write_timeout: Duration,
    cleanup_interval: Duration,
    sweeper: Mutex<Option<SweeperHandle>>,
}

struct SweeperHandle {
    shutdown_tx: oneshot::Sender<()>,
    join_handle: JoinHandle<()>,
}

impl TempChunkStorage {
    /// Create storage over the configured temp directory
    pub fn new(config: &BlobConfig) -> Self {
        Self {
            path: config.temp_path.clone(),
            max_blob_size: config.max_blob_size,
            write_timeout: config.write_timeout,
            cleanup_interval: config.cleanup_timeout,
            sweeper: Mutex::new(None),
        }
    }

    /// Whether the cleanup sweep is running
    pub fn is_open(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// Create the temp directory if needed and start the cleanup sweep
    pub async fn open(&self) -> BlobResult<()> {
        if self.is_open() {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.path).await?;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let path = self.path.clone();
        let write_timeout = self.write_timeout;
        let cleanup_interval = self.cleanup_interval;

        let join_handle = tokio::spawn(async move {
            let mut ticker = interval(cleanup_interval);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        match sweep(&path, write_timeout).await {
                            Ok(removed) if removed > 0 => {
                                info!("Removed {} orphaned chunk buffers", removed);
                            }
                            Ok(_) => debug!("No orphaned chunk buffers found"),
                            Err(e) => warn!("Chunk buffer cleanup failed: {}", e),
                        }
                    }
                }
            }
        });

        *self.sweeper.lock() = Some(SweeperHandle {
            shutdown_tx,
            join_handle,
        });

        info!("Opened temp chunk storage at {}", self.path.display());
        Ok(())
    }

    /// Stop the cleanup sweep
    pub async fn close(&self) -> BlobResult<()> {
        let handle = self.sweeper.lock().take();
        if let Some(handle) = handle {
            let _ = handle.shutdown_tx.send(());
            let _ = handle.join_handle.await;
            info!("Closed temp chunk storage at {}", self.path.display());
        }
        Ok(())
    }

    /// Path of the buffer file for a blob id
    pub fn chunk_file_path(&self, id: &BlobId) -> PathBuf {
        self.path.join(format!("{}.{}", id, CHUNK_FILE_EXT))
    }

    /// Current buffered size for a blob id, 0 if no buffer exists
    pub async fn chunks_size(&self, id: &BlobId) -> BlobResult<u64> {
        match tokio::fs::metadata(self.chunk_file_path(id)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Append bytes to the buffer for a blob id, returning the new
    /// buffered size.
    ///
    /// Fails with `BlobTooLarge` if the resulting size would exceed the
    /// configured maximum, leaving the buffer at its pre-failure size.
    pub async fn append_chunk(&self, id: &BlobId, chunk: &[u8]) -> BlobResult<u64> {
        let current = self.chunks_size(id).await?;
        let size = current + chunk.len() as u64;
        if size > self.max_blob_size {
            return Err(BlobError::blob_too_large(
                id.as_str(),
                size,
                self.max_blob_size,
            ));
        }

        tokio::fs::create_dir_all(&self.path).await?;
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.chunk_file_path(id))
            .await?;
        file.write_all(chunk).await?;
        file.flush().await?;

        Ok(size)
    }

    /// Read the full buffered contents for a blob id
    pub async fn read_chunks(&self, id: &BlobId) -> BlobResult<Vec<u8>> {
        Ok(tokio::fs::read(self.chunk_file_path(id)).await?)
    }

    /// Delete the buffer for a blob id; deleting an absent buffer is fine
    pub async fn delete_chunks(&self, id: &BlobId) -> BlobResult<()> {
        match tokio::fs::remove_file(self.chunk_file_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete all buffer files
    pub async fn clear(&self) -> BlobResult<()> {
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if is_chunk_file(&entry.path()) {
                tokio::fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }

    /// Run one cleanup cycle, deleting buffers untouched for longer than
    /// the write timeout. Returns the number of buffers removed.
    pub async fn cleanup(&self) -> BlobResult<usize> {
        sweep(&self.path, self.write_timeout).await
    }
}

fn is_chunk_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == CHUNK_FILE_EXT)
}

async fn sweep(path: &Path, write_timeout: Duration) -> BlobResult<usize> {
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(path).await?;

    while let Some(entry) = entries.next_entry().await? {
        let entry_path = entry.path();
        if !is_chunk_file(&entry_path) {
            continue;
        }

        // Modification time, so a slow but active writer keeps its buffer
        let modified = entry.metadata().await?.modified()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);

        if age > write_timeout {
            debug!("Removing orphaned chunk buffer {}", entry_path.display());
            tokio::fs::remove_file(&entry_path).await?;
            removed += 1;
        }
    }

    Ok(removed)
}
