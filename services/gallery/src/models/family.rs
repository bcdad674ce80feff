//! Family account model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Family entity
///
/// Deliberately not `Serialize`: the password hash must never leave the
/// service. Use [`FamilyProfile`] for responses.
#[derive(Clone, FromRow)]
pub struct Family {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Family")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// New family creation payload, with the password already hashed
#[derive(Clone)]
pub struct NewFamily {
    pub username: String,
    pub password_hash: String,
}

/// Public view of a family
#[derive(Debug, Clone, Serialize)]
pub struct FamilyProfile {
    pub id: Uuid,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password_hash() {
        let family = Family {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            created_at: Utc::now(),
        };

        let rendered = format!("{:?}", family);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("secret"));
    }
}
