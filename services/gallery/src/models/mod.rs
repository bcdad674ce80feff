//! Gallery service models

pub mod family;
pub mod photo;

// Re-export for convenience
pub use family::{Family, FamilyProfile, NewFamily};
pub use photo::{NewPhoto, Photo};

/// Identifier of a family account
pub type AccountId = uuid::Uuid;

/// Identifier of a stored photo
pub type PhotoId = uuid::Uuid;
