use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob operations
#[derive(Error, Debug)]
pub enum BlobError {
    /// Read of a blob id that does not exist. Distinct from transport
    /// failures so callers can treat "never existed" differently from
    /// "transient failure".
    #[error("Blob not found: {id}")]
    NotFound { id: String },

    /// Write token missing required fields. Local caller error, never
    /// retriable.
    #[error("Write token is invalid: {token}")]
    InvalidToken { token: String },

    /// Buffered bytes would exceed the configured maximum blob size.
    /// Fatal for the write session; the buffer is left at its
    /// pre-failure size.
    #[error("Blob {id} exceeds allowed maximum size of {max_size} ({size} bytes)")]
    BlobTooLarge { id: String, size: u64, max_size: u64 },

    /// Out-of-order part number or unknown part/session
    #[error("Invalid part upload: {reason}")]
    InvalidPart { reason: String },

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl BlobError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an invalid token error
    pub fn invalid_token<S: Into<String>>(token: S) -> Self {
        Self::InvalidToken {
            token: token.into(),
        }
    }

    /// Create a blob too large error
    pub fn blob_too_large<S: Into<String>>(id: S, size: u64, max_size: u64) -> Self {
        Self::BlobTooLarge {
            id: id.into(),
            size,
            max_size,
        }
    }

    /// Create an invalid part error
    pub fn invalid_part<S: Into<String>>(reason: S) -> Self {
        Self::InvalidPart {
            reason: reason.into(),
        }
    }
}
