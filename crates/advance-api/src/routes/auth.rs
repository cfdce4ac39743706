//! Login route

use axum::{Router, extract::State, routing::post};
use tracing::debug;

use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::state::AppState;

use super::types::{Envelope, LoginData, LoginRequest};

/// Account type reported to clients of this service
const USER_TYPE: &str = "advance";

/// POST /api/v1/login
async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Envelope<LoginData>, ApiError> {
    debug!("Login request for user: {}", request.username);

    let outcome = state
        .accounts
        .login(&request.username, &request.password)
        .await?;
    let user = outcome.user;

    Ok(Envelope::new(
        "USER_LOGGED_IN",
        "Login successful",
        LoginData {
            access_token: outcome.token,
            id: user.id,
            user_name: user.username,
            user_type: USER_TYPE,
            email: user.email,
            mobile_no: user.mobile_no,
            expires_in: outcome.expires_in,
        },
    ))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
