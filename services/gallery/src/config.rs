//! Service configuration
//!
//! Settings come from `GALLERY_*` environment variables layered over
//! defaults. Database and Redis settings are read by `common`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

/// Where sessions are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Redis,
    Memory,
}

/// Gallery service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GalleryConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Directory holding uploaded photo blobs
    pub upload_dir: PathBuf,
    /// Session lifetime in seconds; 0 keeps sessions until logout
    pub session_ttl_seconds: u64,
    /// Largest accepted upload request body
    pub max_upload_bytes: usize,
    /// Session store backend
    pub session_backend: SessionBackend,
}

impl GalleryConfig {
    /// Load configuration from the environment
    ///
    /// # Environment Variables
    /// - `GALLERY_BIND_ADDRESS` (default: "0.0.0.0:3000")
    /// - `GALLERY_UPLOAD_DIR` (default: "./uploads")
    /// - `GALLERY_SESSION_TTL_SECONDS` (default: 604800, 7 days)
    /// - `GALLERY_MAX_UPLOAD_BYTES` (default: 10485760)
    /// - `GALLERY_SESSION_BACKEND`: `redis` or `memory` (default: "redis")
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("upload_dir", "./uploads")?
            .set_default("session_ttl_seconds", 604_800_i64)?
            .set_default("max_upload_bytes", 10_485_760_i64)?
            .set_default("session_backend", "redis")?
            .add_source(config::Environment::with_prefix("GALLERY").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Session lifetime, `None` when sessions never expire
    pub fn session_ttl(&self) -> Option<Duration> {
        (self.session_ttl_seconds > 0).then(|| Duration::from_secs(self.session_ttl_seconds))
    }
}
