//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Token lifetime of {0} seconds is out of range")]
    InvalidTtl(i64),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Corrupt password digest: {0}")]
    CorruptDigest(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Stable machine-readable code reported to clients
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "NO_TOKEN",
            AuthError::InvalidAuthHeader => "INVALID_TOKEN",
            AuthError::InvalidToken | AuthError::TokenExpired | AuthError::Jwt(_) => "UNAUTHORIZED",
            AuthError::MissingSecret
            | AuthError::InvalidTtl(_)
            | AuthError::PasswordHash(_)
            | AuthError::CorruptDigest(_) => "SERVER_ERROR",
        }
    }

    /// HTTP status derived from the error code
    pub fn status(&self) -> StatusCode {
        match self.code() {
            "SERVER_ERROR" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::MissingAuthHeader => "No token provided",
            AuthError::InvalidAuthHeader => "Invalid token format",
            AuthError::InvalidToken | AuthError::TokenExpired | AuthError::Jwt(_) => "Unauthorized",
            _ => "Internal server error",
        };

        let body = axum::Json(json!({
            "code": self.code(),
            "message": message,
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        assert_eq!(AuthError::MissingAuthHeader.code(), "NO_TOKEN");
        assert_eq!(AuthError::InvalidAuthHeader.code(), "INVALID_TOKEN");
        assert_eq!(AuthError::TokenExpired.code(), "UNAUTHORIZED");
        assert_eq!(AuthError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::PasswordHash("rng".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AuthError::InvalidTtl(-1).code(), "SERVER_ERROR");
    }
}
