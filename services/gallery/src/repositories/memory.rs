//! In-memory family and photo stores

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{FamilyStore, PhotoStore};
use crate::{
    error::{GalleryError, GalleryResult},
    models::{AccountId, Family, NewFamily, NewPhoto, Photo, PhotoId},
};

/// Family store held in process memory
#[derive(Default)]
pub struct InMemoryFamilyStore {
    families: RwLock<Vec<Family>>,
}

impl InMemoryFamilyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FamilyStore for InMemoryFamilyStore {
    async fn insert(&self, new_family: &NewFamily) -> GalleryResult<Family> {
        let mut families = self.families.write().await;

        if families.iter().any(|f| f.username == new_family.username) {
            return Err(GalleryError::DuplicateIdentity);
        }

        let family = Family {
            id: Uuid::new_v4(),
            username: new_family.username.clone(),
            password_hash: new_family.password_hash.clone(),
            created_at: Utc::now(),
        };
        families.push(family.clone());

        Ok(family)
    }

    async fn find_by_username(&self, username: &str) -> GalleryResult<Option<Family>> {
        let families = self.families.read().await;
        Ok(families.iter().find(|f| f.username == username).cloned())
    }
}

/// Photo store held in process memory, kept in insertion order
#[derive(Default)]
pub struct InMemoryPhotoStore {
    photos: RwLock<Vec<Photo>>,
}

impl InMemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PhotoStore for InMemoryPhotoStore {
    async fn list_for_owner(&self, owner: AccountId) -> GalleryResult<Vec<Photo>> {
        let photos = self.photos.read().await;
        Ok(photos
            .iter()
            .filter(|p| p.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn create(&self, new_photo: &NewPhoto) -> GalleryResult<Photo> {
        let mut photos = self.photos.write().await;

        if photos.iter().any(|p| p.stored_name == new_photo.stored_name) {
            return Err(GalleryError::StorageConflict(new_photo.stored_name.clone()));
        }

        let photo = Photo {
            id: Uuid::new_v4(),
            owner_id: new_photo.owner_id,
            stored_name: new_photo.stored_name.clone(),
            caption: new_photo.caption.clone(),
            created_at: Utc::now(),
        };
        photos.push(photo.clone());

        Ok(photo)
    }

    async fn find_owned(&self, id: PhotoId, owner: AccountId) -> GalleryResult<Option<Photo>> {
        let photos = self.photos.read().await;
        Ok(photos
            .iter()
            .find(|p| p.id == id && p.owner_id == owner)
            .cloned())
    }

    async fn find_by_id(&self, id: PhotoId) -> GalleryResult<Option<Photo>> {
        let photos = self.photos.read().await;
        Ok(photos.iter().find(|p| p.id == id).cloned())
    }

    async fn delete(&self, id: PhotoId) -> GalleryResult<bool> {
        let mut photos = self.photos.write().await;
        let before = photos.len();
        photos.retain(|p| p.id != id);
        Ok(photos.len() < before)
    }
}
