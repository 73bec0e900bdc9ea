use async_trait::async_trait;
use futures::future::join_all;

use crate::{BlobFilter, BlobId, BlobInfo, BlobResult, DataPage, PagingParams};

/// Query and maintenance surface over the blob descriptor catalog.
///
/// The transfer engine itself only touches descriptors at write-begin and
/// read-begin; this trait covers the management operations a backend
/// exposes alongside them. Batch operations fan out across distinct ids
/// only; mutations to a single id are serialized by the backend.
#[async_trait]
pub trait BlobCatalog: Send + Sync {
    /// Page through descriptors matching the filter
    async fn get_blobs_by_filter(
        &self,
        filter: &BlobFilter,
        paging: &PagingParams,
    ) -> BlobResult<DataPage<BlobInfo>>;

    /// Look up one descriptor, `None` if the blob does not exist
    async fn get_blob_by_id(&self, id: &BlobId) -> BlobResult<Option<BlobInfo>>;

    /// Update descriptor metadata; fails with `NotFound` for an unknown id
    async fn update_blob_info(&self, blob: BlobInfo) -> BlobResult<BlobInfo>;

    /// Delete one blob; deleting an absent id is not an error
    async fn delete_blob_by_id(&self, id: &BlobId) -> BlobResult<()>;

    /// Look up several descriptors concurrently, skipping unknown ids
    async fn get_blobs_by_ids(&self, ids: &[BlobId]) -> BlobResult<Vec<BlobInfo>> {
        let lookups = ids.iter().map(|id| self.get_blob_by_id(id));
        let mut blobs = Vec::with_capacity(ids.len());
        for found in join_all(lookups).await {
            if let Some(blob) = found? {
                blobs.push(blob);
            }
        }
        Ok(blobs)
    }

    /// Flip `completed` on each existing id, skipping unknown ids.
    /// Processed sequentially so same-id updates cannot interleave.
    async fn mark_blobs_completed(&self, ids: &[BlobId]) -> BlobResult<()> {
        for id in ids {
            if let Some(mut blob) = self.get_blob_by_id(id).await? {
                if !blob.completed {
                    blob.completed = true;
                    self.update_blob_info(blob).await?;
                }
            }
        }
        Ok(())
    }

    /// Delete several blobs
    async fn delete_blobs_by_ids(&self, ids: &[BlobId]) -> BlobResult<()> {
        for id in ids {
            self.delete_blob_by_id(id).await?;
        }
        Ok(())
    }
}
