use std::fmt;

use crate::{BlobError, BlobId, BlobResult};

/// Delimiter between token fields. Session ids and part tags are
/// delimiter-safe by construction; caller-supplied blob ids are validated.
pub const TOKEN_DELIMITER: char = ';';

/// Opaque write-session token: `[blob_id, session_id, part_tag_1, ...]`.
///
/// The token is the sole piece of write-side state passed between calls.
/// Position 0 is the blob id and position 1 the backend multipart session
/// id, both fixed at `begin_write`. Every subsequent field is a confirmed
/// part tag, appended in upload order; a part's position in the token is
/// its part number. A constructed token always has at least two fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteToken {
    fields: Vec<String>,
}

impl WriteToken {
    /// Build the initial token for a fresh write session
    pub fn begin(blob_id: &BlobId, session_id: &str) -> BlobResult<Self> {
        Self::from_fields(vec![blob_id.as_str().to_string(), session_id.to_string()])
    }

    /// Decode a token from its string form
    pub fn decode(token: &str) -> BlobResult<Self> {
        let fields: Vec<String> = token.split(TOKEN_DELIMITER).map(str::to_string).collect();
        if fields.len() < 2 || fields[..2].iter().any(String::is_empty) {
            return Err(BlobError::invalid_token(token));
        }
        Ok(Self { fields })
    }

    /// Encode the token to its string form
    pub fn encode(&self) -> String {
        self.fields.join(&TOKEN_DELIMITER.to_string())
    }

    /// Return a new token with one confirmed part tag appended
    pub fn append_part(&self, part_tag: &str) -> BlobResult<Self> {
        let mut fields = self.fields.clone();
        fields.push(part_tag.to_string());
        Self::from_fields(fields)
    }

    /// The blob id this session writes to
    pub fn blob_id(&self) -> BlobId {
        BlobId::from(self.fields[0].as_str())
    }

    /// The backend multipart session id
    pub fn session_id(&self) -> &str {
        &self.fields[1]
    }

    /// Confirmed part tags, in part-number order
    pub fn part_tags(&self) -> &[String] {
        &self.fields[2..]
    }

    /// Number of confirmed parts
    pub fn part_count(&self) -> u32 {
        (self.fields.len() - 2) as u32
    }

    fn from_fields(fields: Vec<String>) -> BlobResult<Self> {
        if fields.len() < 2 || fields[..2].iter().any(String::is_empty) {
            return Err(BlobError::invalid_token(fields.join(";")));
        }
        if fields.iter().any(|f| f.contains(TOKEN_DELIMITER)) {
            return Err(BlobError::invalid_token(fields.join(";")));
        }
        Ok(Self { fields })
    }
}

impl fmt::Display for WriteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}
