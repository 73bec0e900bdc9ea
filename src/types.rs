use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use uuid::Uuid;

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Unique identifier for a blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobId(pub String);

impl BlobId {
    /// Generate a new random blob ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from existing string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BlobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BlobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for BlobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Descriptor for a stored blob: identity plus lifecycle metadata.
///
/// The declared `size` is a hint; the authoritative value is
/// backend-reported once the write completes. `create_time` is stamped at
/// write-begin and never mutated afterwards, and `completed` flips exactly
/// once, when `end_write` succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobInfo {
    pub id: BlobId,
    pub group: String,
    pub name: Option<String>,
    pub size: u64,
    pub content_type: String,
    pub create_time: DateTime<Utc>,
    pub expire_time: Option<DateTime<Utc>>,
    pub completed: bool,
}

impl BlobInfo {
    /// Create a descriptor in the given group with a freshly minted id
    pub fn new<S: Into<String>>(group: S) -> Self {
        Self {
            id: BlobId::new(),
            group: group.into(),
            name: None,
            size: 0,
            content_type: "application/octet-stream".to_string(),
            create_time: Utc::now(),
            expire_time: None,
            completed: false,
        }
    }

    /// Use a caller-supplied id instead of the minted one
    pub fn with_id<I: Into<BlobId>>(mut self, id: I) -> Self {
        self.id = id.into();
        self
    }

    /// Set the display filename
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the MIME content type
    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Declare the expected size in bytes
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Set an expiration time; absent means the blob never expires
    pub fn with_expire_time(mut self, expire_time: DateTime<Utc>) -> Self {
        self.expire_time = Some(expire_time);
        self
    }

    /// Whether the blob is expired relative to the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expire_time, Some(t) if t <= now)
    }
}
