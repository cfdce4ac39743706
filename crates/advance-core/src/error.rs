//! Core error types

use advance_auth::AuthError;
use advance_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Role name already exists: {0}")]
    DuplicateRoleName(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Role not found: {0}")]
    RoleNotFound(i64),

    #[error("Corrupt user data: {0}")]
    DataCorrupt(String),

    #[error("Corrupt role data: {0}")]
    RoleDataCorrupt(String),

    #[error("Insert failed: {0}")]
    InsertFailed(String),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl CoreError {
    /// Convert a store error raised while reading role rows, so corrupt
    /// role data is not reported as corrupt user data
    pub fn from_role_read(err: DbError) -> Self {
        match err {
            DbError::Corrupt(msg) => CoreError::RoleDataCorrupt(msg),
            other => other.into(),
        }
    }
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Corrupt(msg) => CoreError::DataCorrupt(msg),
            DbError::InsertFailed(msg) => CoreError::InsertFailed(msg),
            other => CoreError::Database(other),
        }
    }
}
