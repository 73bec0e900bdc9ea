use async_trait::async_trait;
use bytes::Bytes;

use crate::{BlobId, BlobInfo, BlobResult, BlobTransport, WriteToken};

/// No-op transport: accepts writes and returns empty reads.
///
/// Useful for wiring tests and for deployments where blob traffic must be
/// swallowed. Selected by explicit configuration like any other backend.
#[derive(Debug, Clone, Default)]
pub struct NullTransport;

impl NullTransport {
    pub fn new() -> Self {
        Self
    }

    fn synthetic_info(id: BlobId) -> BlobInfo {
        let mut info = BlobInfo::new("").with_id(id);
        info.completed = true;
        info
    }
}

#[async_trait]
impl BlobTransport for NullTransport {
    async fn begin_write(&self, blob: &BlobInfo) -> BlobResult<WriteToken> {
        WriteToken::begin(&blob.id, "null")
    }

    async fn write_chunk(&self, token: WriteToken, _chunk: Bytes) -> BlobResult<WriteToken> {
        Ok(token)
    }

    async fn end_write(&self, token: WriteToken, _chunk: Bytes) -> BlobResult<BlobInfo> {
        Ok(Self::synthetic_info(token.blob_id()))
    }

    async fn abort_write(&self, _token: WriteToken) -> BlobResult<()> {
        Ok(())
    }

    async fn begin_read(&self, id: &BlobId) -> BlobResult<BlobInfo> {
        Ok(Self::synthetic_info(id.clone()))
    }

    async fn read_chunk(&self, _id: &BlobId, _offset: u64, _max_bytes: usize) -> BlobResult<Bytes> {
        Ok(Bytes::new())
    }

    async fn end_read(&self, _id: &BlobId) -> BlobResult<()> {
        Ok(())
    }
}
