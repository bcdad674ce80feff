//! Application state shared across handlers

use crate::{credentials::CredentialStore, lifecycle::BlobLifecycleManager, session::SessionManager};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub credentials: CredentialStore,
    pub sessions: SessionManager,
    pub lifecycle: BlobLifecycleManager,
    pub max_upload_bytes: usize,
}
