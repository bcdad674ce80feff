//! Ownership guard
//!
//! Every path that touches a photo on behalf of a family goes through
//! [`owned_photo`], and every ownership comparison goes through
//! [`authorize`].

use tracing::warn;

use crate::{
    error::{GalleryError, GalleryResult},
    models::{AccountId, Photo, PhotoId},
    repositories::PhotoStore,
};

/// Whether `account` may act on a resource owned by `resource_owner`
pub fn authorize(account: AccountId, resource_owner: AccountId) -> bool {
    account == resource_owner
}

/// Fetch a photo the acting family owns
///
/// The owned lookup filters by id and owner in one query. Only when it misses
/// is the photo looked up by id alone, to tell `Forbidden` from `NotFound`.
pub async fn owned_photo(
    photos: &dyn PhotoStore,
    account: AccountId,
    photo_id: PhotoId,
) -> GalleryResult<Photo> {
    if let Some(photo) = photos.find_owned(photo_id, account).await? {
        if !authorize(account, photo.owner_id) {
            return Err(GalleryError::Forbidden);
        }
        return Ok(photo);
    }

    match photos.find_by_id(photo_id).await? {
        Some(photo) if !authorize(account, photo.owner_id) => {
            warn!("Family {} denied access to photo {}", account, photo_id);
            Err(GalleryError::Forbidden)
        }
        _ => Err(GalleryError::NotFound),
    }
}
