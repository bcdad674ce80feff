//! Session management
//!
//! A session is an opaque random token mapped to a family id. The mapping
//! lives in a [`SessionStore`]: Redis in production, process memory for
//! single-instance runs and tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use common::cache::RedisPool;
use rand::RngCore;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::{GalleryError, GalleryResult},
    models::AccountId,
};

/// Random bytes per session token
const TOKEN_BYTES: usize = 32;

/// Length of an encoded token (base64url, no padding)
const TOKEN_LEN: usize = 43;

/// Who is making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// No valid session
    Anonymous,
    /// A logged-in family
    Family(AccountId),
}

/// Backend holding token to family mappings
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a mapping, replacing any previous one for the token
    async fn put(&self, token: &str, account: AccountId, ttl: Option<Duration>) -> Result<()>;

    /// Look a token up; expired or unknown tokens yield `None`
    async fn get(&self, token: &str) -> Result<Option<AccountId>>;

    /// Remove a mapping; removing an absent token succeeds
    async fn remove(&self, token: &str) -> Result<()>;

    /// Check that the backend answers
    async fn health_check(&self) -> Result<bool>;
}

/// Session store backed by Redis keys `session:{token}`
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_pool: RedisPool,
}

impl RedisSessionStore {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, token: &str, account: AccountId, ttl: Option<Duration>) -> Result<()> {
        self.redis_pool
            .set(
                &Self::key(token),
                &account.to_string(),
                ttl.map(|ttl| ttl.as_secs().max(1)),
            )
            .await
    }

    async fn get(&self, token: &str) -> Result<Option<AccountId>> {
        let Some(value) = self.redis_pool.get(&Self::key(token)).await? else {
            return Ok(None);
        };

        match Uuid::parse_str(&value) {
            Ok(account) => Ok(Some(account)),
            Err(e) => {
                warn!("Discarding session with unreadable family id: {}", e);
                Ok(None)
            }
        }
    }

    async fn remove(&self, token: &str) -> Result<()> {
        self.redis_pool.delete(&Self::key(token)).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        self.redis_pool.health_check().await
    }
}

#[derive(Debug)]
struct MemoryEntry {
    account: AccountId,
    expires_at: Option<Instant>,
}

/// Session store held in process memory
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries, returning how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at.is_none_or(|at| at > now));
        before - entries.len()
    }

    /// Sweep expired entries every `every` until the task is aborted
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let removed = store.cleanup_expired().await;
                if removed > 0 {
                    debug!("Swept {} expired sessions", removed);
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, token: &str, account: AccountId, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            token.to_string(),
            MemoryEntry {
                account,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<AccountId>> {
        let mut entries = self.entries.lock().await;

        let (account, expired) = match entries.get(token) {
            Some(entry) => (
                entry.account,
                entry.expires_at.is_some_and(|at| at <= Instant::now()),
            ),
            None => return Ok(None),
        };

        if expired {
            entries.remove(token);
            return Ok(None);
        }

        Ok(Some(account))
    }

    async fn remove(&self, token: &str) -> Result<()> {
        self.entries.lock().await.remove(token);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Issues, resolves and destroys session tokens
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: Option<Duration>,
}

impl SessionManager {
    /// Create a session manager; `ttl` of `None` keeps sessions until logout
    pub fn new(store: Arc<dyn SessionStore>, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    /// Start a session for a family and return its token
    pub async fn create(&self, account: AccountId) -> GalleryResult<String> {
        let token = generate_token();
        self.store
            .put(&token, account, self.ttl)
            .await
            .map_err(GalleryError::Session)?;

        info!("Created session for family {}", account);
        Ok(token)
    }

    /// Resolve a token to the identity it stands for
    ///
    /// Missing, malformed, unknown and expired tokens are all `Anonymous`.
    /// Only a failing backend is an error.
    pub async fn resolve(&self, token: Option<&str>) -> GalleryResult<Identity> {
        let Some(token) = token.filter(|t| is_well_formed(t)) else {
            return Ok(Identity::Anonymous);
        };

        let account = self.store.get(token).await.map_err(GalleryError::Session)?;
        Ok(account.map_or(Identity::Anonymous, Identity::Family))
    }

    /// End a session; destroying an unknown token is not an error
    pub async fn destroy(&self, token: &str) -> GalleryResult<()> {
        if !is_well_formed(token) {
            return Ok(());
        }

        self.store
            .remove(token)
            .await
            .map_err(GalleryError::Session)?;

        info!("Destroyed session");
        Ok(())
    }

    /// Check that the session backend answers
    pub async fn health_check(&self) -> GalleryResult<bool> {
        self.store.health_check().await.map_err(GalleryError::Session)
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
