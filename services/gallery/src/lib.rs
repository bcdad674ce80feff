//! Family photo gallery service
//!
//! Families register, log in with a session cookie and manage their own
//! captioned photos. The pieces, leaf first:
//!
//! - [`credentials`]: registration and password authentication
//! - [`session`]: opaque session tokens and their stores
//! - [`guard`]: the single ownership check for photo access
//! - [`repositories`]: family and photo records
//! - [`blob`] and [`lifecycle`]: photo bytes on disk, kept in step with the records
//!
//! [`routes`] exposes them over HTTP.

pub mod blob;
pub mod config;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod state;
pub mod validation;

pub use error::{GalleryError, GalleryResult};
pub use state::AppState;
