//! Repositories for families and photos
//!
//! The traits are the seams the core components are built against. The
//! PostgreSQL repositories are used in production; the in-memory stores back
//! single-process runs and tests.

use async_trait::async_trait;

use crate::{
    error::GalleryResult,
    models::{AccountId, Family, NewFamily, NewPhoto, Photo, PhotoId},
};

pub mod family;
pub mod memory;
pub mod photo;

pub use family::FamilyRepository;
pub use memory::{InMemoryFamilyStore, InMemoryPhotoStore};
pub use photo::PhotoRepository;

/// Persistence for family accounts
#[async_trait]
pub trait FamilyStore: Send + Sync {
    /// Insert a family, failing with `DuplicateIdentity` if the username exists
    async fn insert(&self, new_family: &NewFamily) -> GalleryResult<Family>;

    /// Find a family by username
    async fn find_by_username(&self, username: &str) -> GalleryResult<Option<Family>>;

    /// Check that the backing store answers
    async fn health_check(&self) -> GalleryResult<bool> {
        Ok(true)
    }
}

/// Persistence for photo records
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Photos owned by `owner`, in insertion order
    async fn list_for_owner(&self, owner: AccountId) -> GalleryResult<Vec<Photo>>;

    /// Insert a photo record, failing with `StorageConflict` on a reused stored name
    async fn create(&self, new_photo: &NewPhoto) -> GalleryResult<Photo>;

    /// The photo with this id, only if it is owned by `owner`
    async fn find_owned(&self, id: PhotoId, owner: AccountId) -> GalleryResult<Option<Photo>>;

    /// The photo with this id regardless of owner
    async fn find_by_id(&self, id: PhotoId) -> GalleryResult<Option<Photo>>;

    /// Delete a photo record, returning whether a row was removed
    async fn delete(&self, id: PhotoId) -> GalleryResult<bool>;
}
