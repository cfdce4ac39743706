//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database query error: {0}")]
    Query(sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Insert failed: {0}")]
    InsertFailed(String),

    #[error("Corrupt stored data: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Duplicate(db_err.message().to_string())
            }
            sqlx::Error::Decode(e) => DbError::Corrupt(e.to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::Corrupt(format!("column {}: {}", index, source))
            }
            other => DbError::Query(other),
        }
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Corrupt(err.to_string())
    }
}
