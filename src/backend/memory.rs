use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    BlobCatalog, BlobError, BlobFilter, BlobId, BlobInfo, BlobResult, DataPage, PagingParams,
    PartStore,
};

/// In-memory reference backend for testing and development.
///
/// Implements the multipart part store and the descriptor catalog over
/// plain maps. Objects become visible only once their upload session
/// completes; an aborted session leaves no trace. Part numbers must
/// arrive strictly in order, matching the engine's sequential chunk loop.
pub struct MemoryStore {
    objects: Arc<RwLock<HashMap<BlobId, StoredBlob>>>,
    sessions: Arc<RwLock<HashMap<String, UploadSession>>>,
    max_take: usize,
}

struct StoredBlob {
    info: BlobInfo,
    data: Vec<u8>,
}

struct UploadSession {
    blob: BlobInfo,
    parts: Vec<(String, Vec<u8>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_take: 100,
        }
    }

    /// Bound the catalog page size
    pub fn with_max_take(mut self, max_take: usize) -> Self {
        self.max_take = max_take;
        self
    }

    /// Number of open upload sessions
    pub fn open_session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Drop all objects and sessions
    pub fn clear(&self) {
        self.objects.write().clear();
        self.sessions.write().clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            objects: self.objects.clone(),
            sessions: self.sessions.clone(),
            max_take: self.max_take,
        }
    }
}

#[async_trait]
impl PartStore for MemoryStore {
    async fn initiate_upload(&self, blob: &BlobInfo) -> BlobResult<String> {
        let session_id = format!("mp_{}", Uuid::new_v4().simple());
        self.sessions.write().insert(
            session_id.clone(),
            UploadSession {
                blob: blob.clone(),
                parts: Vec::new(),
            },
        );
        Ok(session_id)
    }

    async fn upload_part(
        &self,
        id: &BlobId,
        session_id: &str,
        part_number: u32,
        data: Bytes,
    ) -> BlobResult<String> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| BlobError::invalid_part(format!("unknown session {}", session_id)))?;

        if session.blob.id != *id {
            return Err(BlobError::invalid_part(format!(
                "session {} does not belong to blob {}",
                session_id, id
            )));
        }

        let expected = session.parts.len() as u32 + 1;
        if part_number != expected {
            return Err(BlobError::invalid_part(format!(
                "part {} out of order, expected {}",
                part_number, expected
            )));
        }

        let part_tag = format!("pt_{}", Uuid::new_v4().simple());
        session.parts.push((part_tag.clone(), data.to_vec()));
        Ok(part_tag)
    }

    async fn complete_upload(
        &self,
        id: &BlobId,
        session_id: &str,
        part_tags: &[String],
    ) -> BlobResult<BlobInfo> {
        let session = self
            .sessions
            .write()
            .remove(session_id)
            .ok_or_else(|| BlobError::invalid_part(format!("unknown session {}", session_id)))?;

        let mut data = Vec::new();
        for (index, tag) in part_tags.iter().enumerate() {
            let (stored_tag, part) = session.parts.get(index).ok_or_else(|| {
                BlobError::invalid_part(format!("no uploaded part at position {}", index + 1))
            })?;
            if stored_tag != tag {
                return Err(BlobError::invalid_part(format!(
                    "part tag mismatch at position {}",
                    index + 1
                )));
            }
            data.extend_from_slice(part);
        }

        let mut info = session.blob;
        info.id = id.clone();
        info.size = data.len() as u64;
        info.completed = true;

        self.objects
            .write()
            .insert(id.clone(), StoredBlob { info: info.clone(), data });

        Ok(info)
    }

    async fn abort_upload(&self, _id: &BlobId, session_id: &str) -> BlobResult<()> {
        self.sessions.write().remove(session_id);
        Ok(())
    }

    async fn read_range(&self, id: &BlobId, offset: u64, max_bytes: usize) -> BlobResult<Bytes> {
        let objects = self.objects.read();
        let stored = objects
            .get(id)
            .ok_or_else(|| BlobError::not_found(id.as_str()))?;

        let len = stored.data.len() as u64;
        if offset >= len {
            return Ok(Bytes::new());
        }

        let start = offset as usize;
        let end = (offset + max_bytes as u64).min(len) as usize;
        Ok(Bytes::copy_from_slice(&stored.data[start..end]))
    }

    async fn head(&self, id: &BlobId) -> BlobResult<Option<BlobInfo>> {
        Ok(self.objects.read().get(id).map(|stored| stored.info.clone()))
    }
}

#[async_trait]
impl BlobCatalog for MemoryStore {
    async fn get_blobs_by_filter(
        &self,
        filter: &BlobFilter,
        paging: &PagingParams,
    ) -> BlobResult<DataPage<BlobInfo>> {
        let now = Utc::now();
        let mut matched: Vec<BlobInfo> = self
            .objects
            .read()
            .values()
            .filter(|stored| filter.matches_at(&stored.info, now))
            .map(|stored| stored.info.clone())
            .collect();

        // Deterministic page order regardless of map iteration
        matched.sort_by(|a, b| {
            a.create_time
                .cmp(&b.create_time)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });

        let total = matched.len() as u64;
        let data: Vec<BlobInfo> = matched
            .into_iter()
            .skip(paging.get_skip())
            .take(paging.get_take(self.max_take))
            .collect();

        Ok(DataPage::new(data, Some(total)))
    }

    async fn get_blob_by_id(&self, id: &BlobId) -> BlobResult<Option<BlobInfo>> {
        Ok(self.objects.read().get(id).map(|stored| stored.info.clone()))
    }

    async fn update_blob_info(&self, blob: BlobInfo) -> BlobResult<BlobInfo> {
        let mut objects = self.objects.write();
        let stored = objects
            .get_mut(&blob.id)
            .ok_or_else(|| BlobError::not_found(blob.id.as_str()))?;

        // Size and create time stay backend-authoritative
        stored.info.group = blob.group;
        stored.info.name = blob.name;
        stored.info.content_type = blob.content_type;
        stored.info.expire_time = blob.expire_time;
        stored.info.completed = blob.completed;

        Ok(stored.info.clone())
    }

    async fn delete_blob_by_id(&self, id: &BlobId) -> BlobResult<()> {
        self.objects.write().remove(id);
        Ok(())
    }
}
