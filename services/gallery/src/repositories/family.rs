//! Family repository for database operations

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::FamilyStore;
use crate::{
    error::{GalleryError, GalleryResult},
    models::{Family, NewFamily},
};

/// PostgreSQL-backed family repository
#[derive(Clone)]
pub struct FamilyRepository {
    pool: PgPool,
}

impl FamilyRepository {
    /// Create a new family repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FamilyStore for FamilyRepository {
    async fn insert(&self, new_family: &NewFamily) -> GalleryResult<Family> {
        info!("Creating new family: {}", new_family.username);

        let family = sqlx::query_as::<_, Family>(
            r#"
            INSERT INTO families (id, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_family.username)
        .bind(&new_family.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => GalleryError::DuplicateIdentity,
            _ => GalleryError::from(e),
        })?;

        Ok(family)
    }

    async fn find_by_username(&self, username: &str) -> GalleryResult<Option<Family>> {
        let family = sqlx::query_as::<_, Family>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM families
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(family)
    }

    async fn health_check(&self) -> GalleryResult<bool> {
        Ok(common::database::health_check(&self.pool).await?)
    }
}
