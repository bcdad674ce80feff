//! Photo model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Photo entity
///
/// `stored_name` names exactly one blob in durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Photo {
    pub id: Uuid,
    #[sqlx(rename = "family_id")]
    pub owner_id: Uuid,
    pub stored_name: String,
    pub caption: String,
    pub created_at: DateTime<Utc>,
}

/// New photo creation payload
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub owner_id: Uuid,
    pub stored_name: String,
    pub caption: String,
}
