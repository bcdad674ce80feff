//! Credential store: family registration and password authentication
//!
//! Passwords are hashed with Argon2id on the blocking thread pool. Lookups of
//! unknown usernames still run a full verification against a throwaway hash so
//! both failure paths cost the same and return the same error.

use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use tracing::{info, warn};

use crate::{
    error::{GalleryError, GalleryResult},
    models::{AccountId, NewFamily},
    repositories::FamilyStore,
    validation::{MAX_PASSWORD_LEN, validate_password, validate_username},
};

/// Registration and login against the family store
#[derive(Clone)]
pub struct CredentialStore {
    families: Arc<dyn FamilyStore>,
    argon2: Argon2<'static>,
    dummy_hash: Arc<str>,
}

impl CredentialStore {
    /// Create a credential store using the default Argon2id cost
    pub fn new(families: Arc<dyn FamilyStore>) -> GalleryResult<Self> {
        Self::with_params(families, Params::default())
    }

    /// Create a credential store with explicit Argon2 cost parameters
    pub fn with_params(families: Arc<dyn FamilyStore>, params: Params) -> GalleryResult<Self> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, "family-gallery-timing-equaliser")?;

        Ok(Self {
            families,
            argon2,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Register a new family and return its id
    pub async fn register(&self, username: &str, password: &str) -> GalleryResult<AccountId> {
        validate_username(username).map_err(GalleryError::InvalidInput)?;
        validate_password(password).map_err(GalleryError::InvalidInput)?;

        // Cheap early rejection; the unique constraint still decides races.
        if self.families.find_by_username(username).await?.is_some() {
            return Err(GalleryError::DuplicateIdentity);
        }

        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_with(&argon2, &password))
            .await
            .map_err(|e| GalleryError::Internal(format!("Password hashing task failed: {}", e)))??;

        let family = self
            .families
            .insert(&NewFamily {
                username: username.to_owned(),
                password_hash,
            })
            .await?;

        info!("Registered family {} ({})", family.username, family.id);
        Ok(family.id)
    }

    /// Check a username/password pair and return the family id on success
    ///
    /// Every failure, including an unknown username, is `AuthFailure`.
    pub async fn authenticate(&self, username: &str, password: &str) -> GalleryResult<AccountId> {
        if password.len() > MAX_PASSWORD_LEN {
            return Err(GalleryError::AuthFailure);
        }

        let family = self.families.find_by_username(username).await?;

        let (account, stored_hash) = match &family {
            Some(family) => (Some(family.id), family.password_hash.clone()),
            None => (None, self.dummy_hash.to_string()),
        };

        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let verified =
            tokio::task::spawn_blocking(move || verify_with(&argon2, &password, &stored_hash))
                .await
                .map_err(|e| {
                    GalleryError::Internal(format!("Password verification task failed: {}", e))
                })?;

        match (account, verified) {
            (Some(id), true) => {
                info!("Family {} authenticated", id);
                Ok(id)
            }
            _ => {
                warn!("Failed login attempt for username {}", username);
                Err(GalleryError::AuthFailure)
            }
        }
    }

    /// Check that the family store answers
    pub async fn health_check(&self) -> GalleryResult<bool> {
        self.families.health_check().await
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> GalleryResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GalleryError::Internal(format!("Failed to hash password: {}", e)))
}

/// Constant-time comparison is done inside `verify_password`.
fn verify_with(argon2: &Argon2<'_>, password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}
