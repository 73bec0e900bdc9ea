use async_trait::async_trait;
use bytes::Bytes;

use crate::{BlobId, BlobInfo, BlobResult, WriteToken};

/// Capability set the transfer engine depends on for data movement.
///
/// Concrete adapters (a remote command-invocation backend, a direct
/// object-storage backend) implement this trait outside the engine; the
/// in-process [`ChunkedTransport`](crate::ChunkedTransport) and
/// [`NullTransport`](crate::NullTransport) implementations live in this
/// crate. Backends are selected by explicit configuration, never by
/// runtime type inspection.
///
/// Write sessions move `Idle -> Open (begin_write) -> Writing
/// (write_chunk)* -> Completed (end_write) | Aborted (abort_write)`;
/// both final states are terminal and no further calls on that token are
/// valid. Read sessions move `Idle -> Reading (begin_read) -> Draining
/// (read_chunk)* -> Completed (end_read)`; `end_read` must be called
/// exactly once per successful `begin_read`, even on early termination.
#[async_trait]
pub trait BlobTransport: Send + Sync {
    /// Allocate a backend-side multipart session and return the initial
    /// write token. Safe to retry on transient failure: a fresh token is
    /// generated and a failed call leaves no partial state to clean up.
    async fn begin_write(&self, blob: &BlobInfo) -> BlobResult<WriteToken>;

    /// Upload one chunk. A confirmed part upload appends exactly one part
    /// tag to the returned token; an aggregating transport may buffer the
    /// chunk locally and return the token unchanged.
    async fn write_chunk(&self, token: WriteToken, chunk: Bytes) -> BlobResult<WriteToken>;

    /// Finalize the multipart session, treating a non-empty `chunk` as
    /// one final chunk first. Returns the backend-confirmed descriptor.
    async fn end_write(&self, token: WriteToken, chunk: Bytes) -> BlobResult<BlobInfo>;

    /// Release a backend multipart session without completing it
    async fn abort_write(&self, token: WriteToken) -> BlobResult<()>;

    /// Open a blob for reading; fails with `NotFound` if it does not exist
    async fn begin_read(&self, id: &BlobId) -> BlobResult<BlobInfo>;

    /// Return up to `max_bytes` starting at `offset`. Fewer bytes than
    /// requested signals end-of-data.
    async fn read_chunk(&self, id: &BlobId, offset: u64, max_bytes: usize) -> BlobResult<Bytes>;

    /// Release backend-side read resources
    async fn end_read(&self, id: &BlobId) -> BlobResult<()>;
}
