//! Blob lifecycle: keeps photo rows and their blobs in step
//!
//! Upload writes the blob first and the row second. Delete removes the row
//! first and the blob second. Either way an interruption can leave an
//! unreferenced blob behind but never a row without its blob.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    blob::BlobStore,
    error::{GalleryError, GalleryResult},
    guard,
    models::{AccountId, NewPhoto, Photo, PhotoId},
    repositories::PhotoStore,
    validation::{sanitize_extension, validate_caption},
};

/// Steps of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    /// Bytes are in hand, nothing written
    Received,
    /// Blob written under its reserved name
    Staged,
    /// Row written; the photo is visible
    Committed,
    /// Row write failed and the blob was removed again
    RolledBack,
}

/// Steps of a delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStage {
    /// Row matched to the acting family
    Found,
    /// Row removed; the photo is no longer reachable
    RowRemoved,
    /// Blob removed as well
    BlobRemoved,
    /// Blob removal failed and was logged; the delete still succeeded
    BlobRemovalFailed,
}

/// A photo as handed over by the upload collaborator
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub original_filename: &'a str,
    pub caption: &'a str,
    pub bytes: &'a [u8],
}

/// Coordinates photo rows with their blobs
#[derive(Clone)]
pub struct BlobLifecycleManager {
    blobs: Arc<dyn BlobStore>,
    photos: Arc<dyn PhotoStore>,
}

impl BlobLifecycleManager {
    pub fn new(blobs: Arc<dyn BlobStore>, photos: Arc<dyn PhotoStore>) -> Self {
        Self { blobs, photos }
    }

    /// Photos of a family, in upload order
    pub async fn list(&self, owner: AccountId) -> GalleryResult<Vec<Photo>> {
        self.photos.list_for_owner(owner).await
    }

    /// Store an uploaded photo for `owner`
    pub async fn upload(&self, owner: AccountId, upload: Upload<'_>) -> GalleryResult<Photo> {
        validate_caption(upload.caption).map_err(GalleryError::InvalidInput)?;
        if upload.bytes.is_empty() {
            return Err(GalleryError::InvalidInput("Photo file is empty".to_string()));
        }

        let stored_name = stored_name_for(upload.original_filename);
        trace_upload(&stored_name, UploadStage::Received);

        self.blobs.write(&stored_name, upload.bytes).await?;
        trace_upload(&stored_name, UploadStage::Staged);

        let new_photo = NewPhoto {
            owner_id: owner,
            stored_name: stored_name.clone(),
            caption: upload.caption.to_string(),
        };

        match self.photos.create(&new_photo).await {
            Ok(photo) => {
                trace_upload(&stored_name, UploadStage::Committed);
                info!(
                    "Family {} uploaded photo {} ({} bytes)",
                    owner,
                    photo.id,
                    upload.bytes.len()
                );
                Ok(photo)
            }
            Err(err) => {
                if let Err(remove_err) = self.blobs.remove(&stored_name).await {
                    warn!(
                        "Rollback left unreferenced blob {}: {}",
                        stored_name, remove_err
                    );
                }
                trace_upload(&stored_name, UploadStage::RolledBack);
                Err(err)
            }
        }
    }

    /// Delete a photo owned by `account`
    ///
    /// Returns the final stage reached. A failed blob removal is logged and
    /// still counts as success since the row is already gone.
    pub async fn delete(
        &self,
        account: AccountId,
        photo_id: PhotoId,
    ) -> GalleryResult<DeleteStage> {
        let photo = guard::owned_photo(self.photos.as_ref(), account, photo_id).await?;
        trace_delete(&photo, DeleteStage::Found);

        // Lost a race with another delete of the same photo.
        if !self.photos.delete(photo.id).await? {
            return Err(GalleryError::NotFound);
        }
        trace_delete(&photo, DeleteStage::RowRemoved);

        let stage = match self.blobs.remove(&photo.stored_name).await {
            Ok(()) => DeleteStage::BlobRemoved,
            Err(e) => {
                warn!("Photo {} deleted but its blob remains: {}", photo.id, e);
                DeleteStage::BlobRemovalFailed
            }
        };
        trace_delete(&photo, stage);

        info!("Family {} deleted photo {}", account, photo.id);
        Ok(stage)
    }

    /// Read the bytes of a photo owned by `account`
    pub async fn open(
        &self,
        account: AccountId,
        photo_id: PhotoId,
    ) -> GalleryResult<(Photo, Vec<u8>)> {
        let photo = guard::owned_photo(self.photos.as_ref(), account, photo_id).await?;

        match self.blobs.read(&photo.stored_name).await? {
            Some(bytes) => Ok((photo, bytes)),
            None => {
                error!("Photo {} has no blob at {}", photo.id, photo.stored_name);
                Err(GalleryError::Internal("Photo content is missing".to_string()))
            }
        }
    }
}

/// Unique stored name: upload time in milliseconds plus a random suffix,
/// keeping a sanitised form of the original extension
pub fn stored_name_for(original_filename: &str) -> String {
    let stem = format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    );

    match sanitize_extension(original_filename) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

fn trace_upload(stored_name: &str, stage: UploadStage) {
    debug!("Upload {}: {:?}", stored_name, stage);
}

fn trace_delete(photo: &Photo, stage: DeleteStage) {
    debug!("Delete {} ({}): {:?}", photo.id, photo.stored_name, stage);
}
