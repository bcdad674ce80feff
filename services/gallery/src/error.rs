//! Error types for the gallery service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Every failure a gallery operation can report
#[derive(Error, Debug)]
pub enum GalleryError {
    /// Registration with a username that is already taken
    #[error("Username already taken")]
    DuplicateIdentity,

    /// Unknown username or wrong password; the two are never told apart
    #[error("Invalid credentials")]
    AuthFailure,

    /// The request carries no valid session
    #[error("Authentication required")]
    Unauthenticated,

    /// The photo does not exist
    #[error("Photo not found")]
    NotFound,

    /// The photo exists but belongs to another family
    #[error("Operation not permitted")]
    Forbidden,

    /// A blob with this stored name already exists
    #[error("Stored name already in use: {0}")]
    StorageConflict(String),

    /// Writing a blob to durable storage failed
    #[error("Failed to write blob {name}: {source}")]
    StorageWrite {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Removing a blob from durable storage failed
    #[error("Failed to remove blob {name}: {source}")]
    StorageRemove {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Rejected input with a caller-facing message
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Session backend error
    #[error("Session store error: {0}")]
    Session(anyhow::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for GalleryError {
    fn from(err: sqlx::Error) -> Self {
        GalleryError::Database(DatabaseError::Query(err))
    }
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GalleryError::Unauthenticated => return Redirect::to("/login").into_response(),
            GalleryError::AuthFailure => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            GalleryError::DuplicateIdentity => {
                (StatusCode::CONFLICT, "Username already taken".to_string())
            }
            GalleryError::NotFound => (StatusCode::NOT_FOUND, "Photo not found".to_string()),
            GalleryError::Forbidden => {
                (StatusCode::FORBIDDEN, "Operation not permitted".to_string())
            }
            GalleryError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            GalleryError::StorageConflict(_)
            | GalleryError::StorageWrite { .. }
            | GalleryError::StorageRemove { .. }
            | GalleryError::Database(_)
            | GalleryError::Session(_)
            | GalleryError::Internal(_) => {
                error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for gallery results
pub type GalleryResult<T> = Result<T, GalleryError>;
