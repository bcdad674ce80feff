//! Gallery service routes

use axum::{
    Extension, Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::GalleryError,
    lifecycle::Upload,
    middleware::{
        RequestContext, SESSION_COOKIE, removal_cookie, session_cookie, session_middleware,
    },
    models::{FamilyProfile, PhotoId},
    state::AppState,
};

/// Form for registration and login
#[derive(Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

/// Response for a successful login
#[derive(Serialize)]
pub struct LoginResponse {
    pub family_id: Uuid,
}

/// Create the router for the gallery service
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    let photo_routes = Router::new()
        .route("/dashboard", get(list_photos))
        .route(
            "/photos",
            get(list_photos)
                .post(upload_photo)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/photos/:id", axum::routing::delete(delete_photo))
        .route("/photos/:id/delete", post(delete_photo))
        .route("/photos/:id/blob", get(photo_blob));

    Router::new()
        .route("/health", get(health_check))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout).post(logout))
        .merge(photo_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.credentials.health_check().await.unwrap_or(false);
    let sessions = state.sessions.health_check().await.unwrap_or(false);

    let status = if database && sessions {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ok" } else { "degraded" },
            "service": "gallery-service",
            "database": database,
            "sessions": sessions,
        })),
    )
}

/// Family registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<impl IntoResponse, GalleryError> {
    info!("Registration attempt for username: {}", form.username);

    let id = state
        .credentials
        .register(&form.username, &form.password)
        .await?;

    let profile = FamilyProfile {
        id,
        username: form.username,
    };

    Ok((StatusCode::CREATED, Json(profile)))
}

/// Login endpoint; issues the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<impl IntoResponse, GalleryError> {
    info!("Login attempt for username: {}", form.username);

    let family_id = state
        .credentials
        .authenticate(&form.username, &form.password)
        .await?;

    // Never carry a pre-login session over into the new one.
    if let Some(previous) = jar.get(SESSION_COOKIE) {
        state.sessions.destroy(previous.value()).await?;
    }

    let token = state.sessions.create(family_id).await?;
    let jar = jar.add(session_cookie(token));

    Ok((jar, Json(LoginResponse { family_id })))
}

/// Logout endpoint; safe to call without a session
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, GalleryError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.destroy(cookie.value()).await?;
    }

    Ok((jar.remove(removal_cookie()), Redirect::to("/")))
}

/// Photos of the logged-in family
pub async fn list_photos(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, GalleryError> {
    let family = ctx.require_family()?;
    let photos = state.lifecycle.list(family).await?;

    Ok(Json(photos))
}

/// Multipart upload: a `photo` file part and an optional `caption` part
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, GalleryError> {
    let family = ctx.require_family()?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut caption = String::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed upload: {}", e);
        GalleryError::InvalidInput("Malformed upload".to_string())
    })? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("photo") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    warn!("Failed to read uploaded photo: {}", e);
                    GalleryError::InvalidInput("Failed to read uploaded photo".to_string())
                })?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("caption") => {
                caption = field.text().await.map_err(|_| {
                    GalleryError::InvalidInput("Caption must be text".to_string())
                })?;
            }
            _ => {}
        }
    }

    let (original_filename, bytes) =
        file.ok_or_else(|| GalleryError::InvalidInput("A photo file is required".to_string()))?;

    let photo = state
        .lifecycle
        .upload(
            family,
            Upload {
                original_filename: &original_filename,
                caption: &caption,
                bytes: &bytes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(photo)))
}

/// Delete a photo of the logged-in family
pub async fn delete_photo(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GalleryError> {
    let family = ctx.require_family()?;
    let id = parse_photo_id(&id)?;
    state.lifecycle.delete(family, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Raw bytes of a photo of the logged-in family
pub async fn photo_blob(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GalleryError> {
    let family = ctx.require_family()?;
    let id = parse_photo_id(&id)?;
    let (photo, bytes) = state.lifecycle.open(family, id).await?;

    Ok(([(header::CONTENT_TYPE, content_type(&photo.stored_name))], bytes))
}

/// An id that is not a UUID cannot name any photo
fn parse_photo_id(raw: &str) -> Result<PhotoId, GalleryError> {
    Uuid::parse_str(raw).map_err(|_| GalleryError::NotFound)
}

fn content_type(stored_name: &str) -> &'static str {
    match stored_name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_stored_name() {
        assert_eq!(content_type("1-abc.jpg"), "image/jpeg");
        assert_eq!(content_type("1-abc.png"), "image/png");
        assert_eq!(content_type("1-abc"), "application/octet-stream");
        assert_eq!(content_type("1-abc.bin"), "application/octet-stream");
    }

    #[test]
    fn test_malformed_photo_id_is_not_found() {
        assert!(matches!(parse_photo_id("abc"), Err(GalleryError::NotFound)));
        let id = Uuid::new_v4();
        assert_eq!(parse_photo_id(&id.to_string()).unwrap(), id);
    }
}
