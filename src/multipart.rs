use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::{
    BlobConfig, BlobError, BlobId, BlobInfo, BlobResult, BlobTransport, TempChunkStorage,
    WriteToken,
};

/// Multipart storage primitives a direct object-storage backend exposes.
///
/// This is the narrow seam between the transfer engine and a backend that
/// enforces a minimum part size: the engine owns chunk aggregation, token
/// bookkeeping, and local buffers; the store owns the actual part uploads.
#[async_trait]
pub trait PartStore: Send + Sync {
    /// Allocate a multipart session for the descriptor, returning the
    /// backend session id
    async fn initiate_upload(&self, blob: &BlobInfo) -> BlobResult<String>;

    /// Upload one part, returning its confirmation tag. Part numbers start
    /// at 1 and must arrive in order.
    async fn upload_part(
        &self,
        id: &BlobId,
        session_id: &str,
        part_number: u32,
        data: Bytes,
    ) -> BlobResult<String>;

    /// Assemble the confirmed parts into the final object and return the
    /// backend-confirmed descriptor
    async fn complete_upload(
        &self,
        id: &BlobId,
        session_id: &str,
        part_tags: &[String],
    ) -> BlobResult<BlobInfo>;

    /// Discard an uncompleted session
    async fn abort_upload(&self, id: &BlobId, session_id: &str) -> BlobResult<()>;

    /// Return up to `max_bytes` of object content starting at `offset`;
    /// fewer bytes than requested signals end-of-data
    async fn read_range(&self, id: &BlobId, offset: u64, max_bytes: usize) -> BlobResult<Bytes>;

    /// Descriptor lookup, `None` if the blob does not exist
    async fn head(&self, id: &BlobId) -> BlobResult<Option<BlobInfo>>;
}

/// [`BlobTransport`] over any [`PartStore`], absorbing chunks smaller than
/// the backend's minimum part size.
///
/// Incoming chunks are appended to a per-blob buffer file and uploaded as
/// a single part once the buffered size reaches `min_chunk_size`. The
/// buffer is deleted only after its upload succeeds, so a failed flush
/// leaves it intact for a caller-driven retry. A blob whose only chunk
/// arrives at `end_write` is uploaded straight from memory and never
/// touches disk.
pub struct ChunkedTransport<S: PartStore> {
    store: Arc<S>,
    temp: Arc<TempChunkStorage>,
    config: BlobConfig,
}

impl<S: PartStore> ChunkedTransport<S> {
    /// Create a transport over the given part store and temp storage
    pub fn new(store: S, temp: Arc<TempChunkStorage>, config: BlobConfig) -> Self {
        Self {
            store: Arc::new(store),
            temp,
            config,
        }
    }

    /// Create from an already shared part store
    pub fn from_arc(store: Arc<S>, temp: Arc<TempChunkStorage>, config: BlobConfig) -> Self {
        Self {
            store,
            temp,
            config,
        }
    }

    /// Get the underlying part store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Upload the buffered chunks as one part and delete the buffer.
    /// Deletion happens only after the upload succeeded.
    async fn flush_chunks(&self, token: WriteToken) -> BlobResult<WriteToken> {
        let id = token.blob_id();
        let data = self.temp.read_chunks(&id).await?;
        let part_number = token.part_count() + 1;

        let part_tag = self
            .store
            .upload_part(&id, token.session_id(), part_number, Bytes::from(data))
            .await?;
        let token = token.append_part(&part_tag)?;

        self.temp.delete_chunks(&id).await?;
        debug!("Flushed chunk buffer for blob {} as part {}", id, part_number);

        Ok(token)
    }

    /// Upload a single chunk as one part directly from memory
    async fn upload_direct(&self, token: WriteToken, chunk: Bytes) -> BlobResult<WriteToken> {
        let id = token.blob_id();
        let part_number = token.part_count() + 1;
        let part_tag = self
            .store
            .upload_part(&id, token.session_id(), part_number, chunk)
            .await?;
        token.append_part(&part_tag)
    }
}

#[async_trait]
impl<S: PartStore> BlobTransport for ChunkedTransport<S> {
    async fn begin_write(&self, blob: &BlobInfo) -> BlobResult<WriteToken> {
        let session_id = self.store.initiate_upload(blob).await?;
        WriteToken::begin(&blob.id, &session_id)
    }

    async fn write_chunk(&self, token: WriteToken, chunk: Bytes) -> BlobResult<WriteToken> {
        let id = token.blob_id();
        let size = self.temp.append_chunk(&id, &chunk).await?;

        if size >= self.config.min_chunk_size {
            return self.flush_chunks(token).await;
        }

        Ok(token)
    }

    async fn end_write(&self, token: WriteToken, chunk: Bytes) -> BlobResult<BlobInfo> {
        let id = token.blob_id();
        let buffered = self.temp.chunks_size(&id).await?;

        let token = if buffered > 0 {
            // Earlier chunks are already on disk; append the trailing
            // bytes and upload the whole buffer as the final part
            if !chunk.is_empty() {
                self.temp.append_chunk(&id, &chunk).await?;
            }
            self.flush_chunks(token).await?
        } else if !chunk.is_empty() {
            // First and only chunk: skip the buffer file entirely
            self.upload_direct(token, chunk).await?
        } else {
            token
        };

        let info = self
            .store
            .complete_upload(&id, token.session_id(), token.part_tags())
            .await?;
        debug!(
            "Completed write of blob {} ({} parts, {} bytes)",
            id,
            token.part_count(),
            info.size
        );

        Ok(info)
    }

    async fn abort_write(&self, token: WriteToken) -> BlobResult<()> {
        let id = token.blob_id();
        self.store.abort_upload(&id, token.session_id()).await?;
        self.temp.delete_chunks(&id).await
    }

    async fn begin_read(&self, id: &BlobId) -> BlobResult<BlobInfo> {
        self.store
            .head(id)
            .await?
            .ok_or_else(|| BlobError::not_found(id.as_str()))
    }

    async fn read_chunk(&self, id: &BlobId, offset: u64, max_bytes: usize) -> BlobResult<Bytes> {
        self.store.read_range(id, offset, max_bytes).await
    }

    async fn end_read(&self, _id: &BlobId) -> BlobResult<()> {
        Ok(())
    }
}
