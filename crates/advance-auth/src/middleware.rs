//! Authentication middleware for Axum

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::jwt::TokenManager;

/// Authenticated user information attached to the request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Extract the credential from a `Bearer <token>` header value
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Authentication middleware
///
/// Rejects requests without a verifiable bearer token. On success the
/// resolved [`AuthUser`] is added to the request extensions.
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match authenticate(&tokens, &request) {
        Ok(user) => user,
        Err(e) => {
            warn!(
                "Rejected request to {}: {} ({})",
                request.uri().path(),
                e,
                e.code()
            );
            metrics::counter!("advance_rejected_tokens_total", "code" => e.code()).increment(1);
            return Err(e);
        }
    };

    debug!("Authenticated user id {}", user.id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn authenticate(tokens: &TokenManager, request: &Request) -> Result<AuthUser, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = extract_bearer_token(header)?;
    let id = tokens.verify(token)?;
    Ok(AuthUser { id })
}
