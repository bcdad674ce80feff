//! Photo repository for database operations

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::PhotoStore;
use crate::{
    error::{GalleryError, GalleryResult},
    models::{AccountId, NewPhoto, Photo, PhotoId},
};

/// PostgreSQL-backed photo repository
#[derive(Clone)]
pub struct PhotoRepository {
    pool: PgPool,
}

impl PhotoRepository {
    /// Create a new photo repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoStore for PhotoRepository {
    async fn list_for_owner(&self, owner: AccountId) -> GalleryResult<Vec<Photo>> {
        let photos = sqlx::query_as::<_, Photo>(
            r#"
            SELECT id, family_id, stored_name, caption, created_at
            FROM photos
            WHERE family_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(photos)
    }

    async fn create(&self, new_photo: &NewPhoto) -> GalleryResult<Photo> {
        info!(
            "Recording photo {} for family {}",
            new_photo.stored_name, new_photo.owner_id
        );

        let photo = sqlx::query_as::<_, Photo>(
            r#"
            INSERT INTO photos (id, family_id, stored_name, caption)
            VALUES ($1, $2, $3, $4)
            RETURNING id, family_id, stored_name, caption, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_photo.owner_id)
        .bind(&new_photo.stored_name)
        .bind(&new_photo.caption)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                GalleryError::StorageConflict(new_photo.stored_name.clone())
            }
            _ => GalleryError::from(e),
        })?;

        Ok(photo)
    }

    async fn find_owned(&self, id: PhotoId, owner: AccountId) -> GalleryResult<Option<Photo>> {
        let photo = sqlx::query_as::<_, Photo>(
            r#"
            SELECT id, family_id, stored_name, caption, created_at
            FROM photos
            WHERE id = $1 AND family_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(photo)
    }

    async fn find_by_id(&self, id: PhotoId) -> GalleryResult<Option<Photo>> {
        let photo = sqlx::query_as::<_, Photo>(
            r#"
            SELECT id, family_id, stored_name, caption, created_at
            FROM photos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(photo)
    }

    async fn delete(&self, id: PhotoId) -> GalleryResult<bool> {
        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
