//! Request/Response DTOs

use advance_core::ModulePermissions;
use advance_db::{Role, User};
use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Success envelope: `{code, message, data}`
#[derive(Serialize)]
pub struct Envelope<T> {
    pub code: &'static str,
    pub message: &'static str,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(code: &'static str, message: &'static str, data: T) -> Self {
        Self {
            code,
            message,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// ==================== Auth Types ====================

/// Login request. Missing fields are treated as blank.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login response payload
#[derive(Serialize)]
pub struct LoginData {
    pub access_token: String,
    pub id: i64,
    pub user_name: String,
    pub user_type: &'static str,
    pub email: String,
    pub mobile_no: String,
    pub expires_in: i64,
}

// ==================== User Types ====================

#[derive(Serialize)]
pub struct UsersData {
    pub users: Vec<User>,
    pub count: usize,
}

// ==================== Role Types ====================

#[derive(Serialize)]
pub struct RolesData {
    pub roles: Vec<Role>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct PermissionsData {
    pub permissions_by_module: Vec<ModulePermissions>,
}
