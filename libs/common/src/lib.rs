//! Common library for the family gallery
//!
//! This crate provides the infrastructure shared by the gallery service:
//! PostgreSQL connectivity and schema, the Redis handle backing sessions,
//! and the error types they report.

pub mod cache;
pub mod database;
pub mod error;
