//! API error types
//!
//! Every failure leaves the service as `{code, message}` where `code` is a
//! stable [`ErrorCode`] and the HTTP status is derived from that code.

use advance_core::CoreError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Machine-readable failure codes reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    UqUsername,
    UqRoleName,
    InvalidCredentials,
    NoToken,
    InvalidToken,
    Unauthorized,
    NotFound,
    UserDataCorrupt,
    DbInsertFailed,
    ServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::UqUsername => "UQ_USERNAME",
            ErrorCode::UqRoleName => "UQ_ROLE_NAME",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::NoToken => "NO_TOKEN",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::UserDataCorrupt => "USER_DATA_CORRUPT",
            ErrorCode::DbInsertFailed => "DB_INSERT_FAILED",
            ErrorCode::ServerError => "SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::UqUsername | ErrorCode::UqRoleName => StatusCode::CONFLICT,
            ErrorCode::InvalidCredentials
            | ErrorCode::NoToken
            | ErrorCode::InvalidToken
            | ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::UserDataCorrupt | ErrorCode::DbInsertFailed | ErrorCode::ServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn from_auth_code(code: &str) -> Self {
        match code {
            "NO_TOKEN" => ErrorCode::NoToken,
            "INVALID_TOKEN" => ErrorCode::InvalidToken,
            "UNAUTHORIZED" => ErrorCode::Unauthorized,
            _ => ErrorCode::ServerError,
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// The stable code this error is reported under
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::BadRequest(_) => ErrorCode::InvalidInput,
            ApiError::Core(e) => match e {
                CoreError::InvalidInput(_) => ErrorCode::InvalidInput,
                CoreError::DuplicateUsername(_) => ErrorCode::UqUsername,
                CoreError::DuplicateRoleName(_) => ErrorCode::UqRoleName,
                CoreError::InvalidCredentials => ErrorCode::InvalidCredentials,
                CoreError::UserNotFound(_) | CoreError::RoleNotFound(_) => ErrorCode::NotFound,
                CoreError::DataCorrupt(_) => ErrorCode::UserDataCorrupt,
                CoreError::InsertFailed(_) => ErrorCode::DbInsertFailed,
                CoreError::Auth(e) => ErrorCode::from_auth_code(e.code()),
                CoreError::RoleDataCorrupt(_) | CoreError::Database(_) => ErrorCode::ServerError,
            },
        }
    }

    /// Client-facing message. Server-side failures never expose detail.
    fn client_message(&self, code: ErrorCode) -> String {
        match code {
            ErrorCode::ServerError => "Internal server error".to_string(),
            ErrorCode::UserDataCorrupt => "User data is corrupt".to_string(),
            ErrorCode::DbInsertFailed => "Failed to store record".to_string(),
            ErrorCode::UqUsername => "Username already exists".to_string(),
            ErrorCode::UqRoleName => "Role name already exists".to_string(),
            ErrorCode::InvalidCredentials => "Invalid username or password".to_string(),
            ErrorCode::NoToken => "No token provided".to_string(),
            ErrorCode::InvalidToken => "Invalid token format".to_string(),
            ErrorCode::Unauthorized => "Unauthorized".to_string(),
            ErrorCode::InvalidInput | ErrorCode::NotFound => match self {
                ApiError::BadRequest(msg) => msg.clone(),
                ApiError::Core(CoreError::InvalidInput(msg)) => msg.clone(),
                ApiError::Core(other) => other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = code.status();

        if status.is_server_error() {
            error!("Request failed with {}: {}", code.as_str(), self);
        } else if status == StatusCode::UNAUTHORIZED {
            warn!("Request rejected with {}: {}", code.as_str(), self);
        }

        let body = axum::Json(json!({
            "code": code.as_str(),
            "message": self.client_message(code),
        }));

        (status, body).into_response()
    }
}
