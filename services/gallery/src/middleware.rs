//! Session cookie resolution
//!
//! The middleware resolves the session cookie once per request and stores an
//! immutable [`RequestContext`] in the request extensions. Handlers take it
//! with `Extension<RequestContext>`.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::error;

use crate::{
    error::{GalleryError, GalleryResult},
    models::AccountId,
    session::Identity,
    state::AppState,
};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "family_session";

/// Identity of the caller for the duration of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    identity: Identity,
}

impl RequestContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    /// The acting family, or `Unauthenticated` for anonymous callers
    pub fn require_family(&self) -> GalleryResult<AccountId> {
        match self.identity {
            Identity::Family(account) => Ok(account),
            Identity::Anonymous => Err(GalleryError::Unauthenticated),
        }
    }
}

/// Resolve the session cookie into a [`RequestContext`]
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, GalleryError> {
    let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_owned());

    let identity = state
        .sessions
        .resolve(token.as_deref())
        .await
        .inspect_err(|e| error!("Failed to resolve session: {}", e))?;

    req.extensions_mut().insert(RequestContext::new(identity));

    Ok(next.run(req).await)
}

/// Cookie carrying a freshly issued session token
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie that clears the session cookie on the client
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}
