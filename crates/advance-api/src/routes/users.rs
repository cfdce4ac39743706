//! User management routes

use advance_auth::AuthUser;
use advance_core::{Registration, UserPatch};
use advance_db::User;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use tracing::info;

use crate::error::ApiError;
use crate::extract::{ValidJson, parse_path_id};
use crate::state::AppState;

use super::types::{Envelope, UsersData};

/// POST /api/v1/advance/users
async fn create_user(
    caller: AuthUser,
    State(state): State<AppState>,
    ValidJson(registration): ValidJson<Registration>,
) -> Result<(StatusCode, Envelope<User>), ApiError> {
    let user = state.accounts.register(registration, Some(caller.id)).await?;

    info!("User {} created by {}", user.id, caller.id);

    Ok((
        StatusCode::CREATED,
        Envelope::new("USER_CREATED", "User created successfully", user),
    ))
}

/// GET /api/v1/advance/users
async fn list_users(State(state): State<AppState>) -> Result<Envelope<UsersData>, ApiError> {
    let users = state.accounts.list_users().await?;

    Ok(Envelope::new(
        "USERS_FETCHED",
        "Users fetched successfully",
        UsersData {
            count: users.len(),
            users,
        },
    ))
}

/// PATCH /api/v1/advance/users/{id}
async fn update_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<UserPatch>,
) -> Result<Envelope<User>, ApiError> {
    let id = parse_path_id(&id)?;
    let user = state.accounts.patch(id, request).await?;

    info!("User {} updated by {}", user.id, caller.id);

    Ok(Envelope::new(
        "USER_UPDATED",
        "User updated successfully",
        user,
    ))
}

/// GET /api/v1/me
async fn me(caller: AuthUser, State(state): State<AppState>) -> Result<Envelope<User>, ApiError> {
    let user = state.accounts.get_user(caller.id).await?;

    Ok(Envelope::new(
        "PROFILE_FETCHED",
        "Profile fetched successfully",
        user,
    ))
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/advance/users", get(list_users).post(create_user))
        .route("/advance/users/{id}", patch(update_user))
        .route("/me", get(me))
}
