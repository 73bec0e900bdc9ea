use std::path::PathBuf;
use std::time::Duration;

/// Configuration for blob transfer operations
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Read/write chunk size used by the streaming adapter
    pub chunk_size: usize,

    /// Aggregator flush threshold; matches the backend's minimum
    /// multipart part size
    pub min_chunk_size: u64,

    /// Hard cap on locally buffered bytes per write session
    pub max_blob_size: u64,

    /// Interval between cleanup sweeps over the temp directory
    pub cleanup_timeout: Duration,

    /// Age after which an untouched chunk buffer is considered orphaned
    pub write_timeout: Duration,

    /// Directory for per-blob chunk buffer files
    pub temp_path: PathBuf,

    /// Default and maximum page size for catalog queries
    pub max_take: usize,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4 * 1024 * 1024,              // 4MB
            min_chunk_size: 5 * 1024 * 1024,          // 5MB (S3 minimum part)
            max_blob_size: 100 * 1024 * 1024 * 1024,  // 100GB
            cleanup_timeout: Duration::from_millis(9_000_000),
            write_timeout: Duration::from_millis(9_000_000),
            temp_path: PathBuf::from("./data/temp"),
            max_take: 100,
        }
    }
}

impl BlobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the streaming chunk size
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Set the aggregator flush threshold
    pub fn with_min_chunk_size(mut self, bytes: u64) -> Self {
        self.min_chunk_size = bytes;
        self
    }

    /// Set the maximum buffered blob size
    pub fn with_max_blob_size(mut self, bytes: u64) -> Self {
        self.max_blob_size = bytes;
        self
    }

    /// Set the cleanup sweep interval
    pub fn with_cleanup_timeout(mut self, interval: Duration) -> Self {
        self.cleanup_timeout = interval;
        self
    }

    /// Set the orphan age threshold
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the temp buffer directory
    pub fn with_temp_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.temp_path = path.into();
        self
    }

    /// Set the maximum catalog page size
    pub fn with_max_take(mut self, max_take: usize) -> Self {
        self.max_take = max_take;
        self
    }
}
