use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::{BlobConfig, BlobError, BlobId, BlobInfo, BlobResult, BlobTransport, ByteStream};

/// Orchestrates chunked transfers over any [`BlobTransport`].
///
/// Turns a continuous input stream into a bounded sequence of
/// `write_chunk` calls and reconstructs a continuous output stream from
/// offset-addressed `read_chunk` calls. Chunk loops are strictly
/// sequential per session: the token accumulates confirmed parts in
/// order and read offsets advance monotonically. Fanning out across
/// different blob ids is safe and expected.
pub struct BlobStreamer {
    transport: Arc<dyn BlobTransport>,
    chunk_size: usize,
}

impl BlobStreamer {
    /// Create a streamer over the given transport
    pub fn new<T: BlobTransport + 'static>(transport: T, config: &BlobConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            chunk_size: config.chunk_size,
        }
    }

    /// Create a streamer over an already shared transport
    pub fn from_arc(transport: Arc<dyn BlobTransport>, config: &BlobConfig) -> Self {
        Self {
            transport,
            chunk_size: config.chunk_size,
        }
    }

    /// Write a blob from an async reader, returning the authoritative
    /// backend-confirmed descriptor.
    ///
    /// The reader is drained fully before the session is finalized;
    /// partial reads are concatenated so chunk boundaries do not depend
    /// on how the underlying stream happens to split its bytes.
    pub async fn create_from_stream<R>(&self, blob: BlobInfo, reader: &mut R) -> BlobResult<BlobInfo>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut blob = blob;
        blob.create_time = Utc::now();
        blob.completed = false;

        let mut token = self.transport.begin_write(&blob).await?;
        let mut buf = vec![0u8; self.chunk_size];

        loop {
            let n = read_full(reader, &mut buf).await?;
            if n == 0 {
                break;
            }
            token = self
                .transport
                .write_chunk(token, Bytes::copy_from_slice(&buf[..n]))
                .await?;
        }

        let info = self.transport.end_write(token, Bytes::new()).await?;
        info!("Wrote blob {} ({} bytes)", info.id, info.size);
        Ok(info)
    }

    /// Write a blob from an in-memory buffer
    pub async fn create_from_data(&self, blob: BlobInfo, data: &[u8]) -> BlobResult<BlobInfo> {
        let mut reader = Cursor::new(data);
        self.create_from_stream(blob, &mut reader).await
    }

    /// Read a blob into an async writer.
    ///
    /// Bytes are forwarded as they arrive; the whole object is never
    /// buffered. `end_read` is always issued after a successful
    /// `begin_read`, even when draining fails partway.
    pub async fn read_into_stream<W>(&self, id: &BlobId, writer: &mut W) -> BlobResult<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.transport.begin_read(id).await?;

        let drained = self.drain(id, writer).await;
        let ended = self.transport.end_read(id).await;
        drained?;
        ended
    }

    /// Read a blob fully into memory
    pub async fn read_data(&self, id: &BlobId) -> BlobResult<Vec<u8>> {
        let mut writer = Cursor::new(Vec::new());
        self.read_into_stream(id, &mut writer).await?;
        Ok(writer.into_inner())
    }

    /// Expose a blob's content as a stream of byte chunks
    pub fn read_stream(&self, id: BlobId) -> ByteStream {
        let transport = self.transport.clone();
        let chunk_size = self.chunk_size;

        Box::pin(async_stream::stream! {
            if let Err(e) = transport.begin_read(&id).await {
                yield Err(into_io_error(e));
                return;
            }

            let mut offset = 0u64;
            loop {
                match transport.read_chunk(&id, offset, chunk_size).await {
                    Ok(chunk) => {
                        if chunk.is_empty() {
                            break;
                        }
                        let short = chunk.len() < chunk_size;
                        offset += chunk.len() as u64;
                        yield Ok(chunk);
                        if short {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = transport.end_read(&id).await;
                        yield Err(into_io_error(e));
                        return;
                    }
                }
            }

            if let Err(e) = transport.end_read(&id).await {
                yield Err(into_io_error(e));
            }
        })
    }

    async fn drain<W>(&self, id: &BlobId, writer: &mut W) -> BlobResult<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut offset = 0u64;
        loop {
            let chunk = self
                .transport
                .read_chunk(id, offset, self.chunk_size)
                .await?;
            if chunk.is_empty() {
                break;
            }

            writer.write_all(&chunk).await?;
            offset += chunk.len() as u64;

            // A short read signals end-of-data; never probe past it
            if chunk.len() < self.chunk_size {
                break;
            }
        }

        writer.flush().await?;
        Ok(())
    }
}

/// Fill the buffer from the reader, stopping early only at end-of-stream
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn into_io_error(e: BlobError) -> std::io::Error {
    let kind = match &e {
        BlobError::NotFound { .. } => std::io::ErrorKind::NotFound,
        _ => std::io::ErrorKind::Other,
    };
    std::io::Error::new(kind, e.to_string())
}
