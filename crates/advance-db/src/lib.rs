//! Advance Access Database Layer
//!
//! This crate is the credential store adapter for Advance Access. It owns the
//! user, role, module and permission tables and exposes typed, parameterized
//! queries over SQLite via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::{Database, StoreTx};

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
