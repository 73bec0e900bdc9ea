//! # blob-transfer: Client-side chunked blob transfer engine
//!
//! `blob-transfer` moves large binary objects to and from remote storage
//! backends without ever holding a whole object in memory. It splits
//! input streams into bounded chunks, tracks multipart-upload state in an
//! opaque self-describing token, aggregates undersized chunks on local
//! disk until a backend's minimum part size is met, and reassembles
//! continuous output streams from offset-addressed chunk reads.
//!
//! ## Key Features
//!
//! - **Streaming-first**: bounded memory regardless of blob size, on both
//!   the write and the read path
//! - **Multipart uploads**: token-tracked part accumulation with a local
//!   disk aggregator for backends that demand large minimum parts
//! - **Resumable by design**: every chunk operation returns the complete
//!   session state, so a caller-driven retry picks up at the last
//!   confirmed part
//! - **Backend agnostic**: one [`BlobTransport`] capability set; the
//!   aggregating [`ChunkedTransport`] plugs any [`PartStore`] behind it
//! - **Self-cleaning**: a periodic sweep reclaims chunk buffers leaked by
//!   crashed or abandoned write sessions
//!
//! ## Quick Start
//!
//! ```rust
//! use blob_transfer::prelude::*;
//! use blob_transfer::{MemoryStore, TempChunkStorage};
//! use std::io::Cursor;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! // 1. Configure and open local chunk buffering
//! let config = BlobConfig::default()
//!     .with_temp_path(std::env::temp_dir().join("blob-transfer-quickstart"));
//! let temp = Arc::new(TempChunkStorage::new(&config));
//! temp.open().await?;
//!
//! // 2. Wire a transport over a part store (in-memory here; an object
//! //    storage adapter implements `PartStore` the same way)
//! let transport = ChunkedTransport::new(MemoryStore::new(), temp.clone(), config.clone());
//! let blobs = BlobStreamer::new(transport, &config);
//!
//! // 3. Stream a blob in
//! let blob = BlobInfo::new("greetings")
//!     .with_name("hello.txt")
//!     .with_content_type("text/plain");
//! let mut reader = Cursor::new(b"Hello, world!".to_vec());
//! let stored = blobs.create_from_stream(blob, &mut reader).await?;
//!
//! // 4. Stream it back out
//! let data = blobs.read_data(&stored.id).await?;
//! assert_eq!(data, b"Hello, world!");
//!
//! temp.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   BlobStreamer   │  ← chunk loops over continuous streams
//! ├──────────────────┤
//! │  BlobTransport   │  ← begin/write/end capability set
//! ├──────────────────┤
//! │ ChunkedTransport │  ← token bookkeeping + disk aggregation
//! ├──────────────────┤
//! │    PartStore     │  ← backend multipart primitives
//! └──────────────────┘
//! ```
//!
//! A remote command-style backend that accepts arbitrarily small chunks
//! implements [`BlobTransport`] directly; a direct object-storage backend
//! with a minimum part size implements [`PartStore`] and reuses
//! [`ChunkedTransport`] for aggregation, buffering and token handling.

pub mod backend;
mod catalog;
mod config;
mod error;
mod filter;
mod multipart;
mod streaming;
mod temp;
mod token;
pub mod transport;
mod types;

// Re-export main types for clean API
pub use backend::{MemoryStore, NullTransport};
pub use catalog::BlobCatalog;
pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use filter::{BlobFilter, DataPage, FilterClause, PagingParams};
pub use multipart::{ChunkedTransport, PartStore};
pub use streaming::BlobStreamer;
pub use temp::TempChunkStorage;
pub use token::{WriteToken, TOKEN_DELIMITER};
pub use transport::BlobTransport;
pub use types::{BlobId, BlobInfo, ByteStream};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobConfig, BlobError, BlobId, BlobInfo, BlobResult, BlobStreamer, BlobTransport,
        ByteStream, ChunkedTransport, PartStore,
    };
}
