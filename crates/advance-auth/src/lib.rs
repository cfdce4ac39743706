//! Advance Access Authentication
//!
//! This crate provides password hashing, bearer token issuance and
//! verification, and the axum middleware that gates protected routes.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use error::AuthError;
pub use jwt::{Claims, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS, TokenManager};
pub use middleware::{auth_middleware, extract_bearer_token, AuthUser};
pub use password::{hash_password, verify_password};
