//! Role and permission catalog routes

use advance_auth::AuthUser;
use advance_core::CreateRole;
use advance_db::{Role, RoleOption};
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::info;

use crate::error::ApiError;
use crate::extract::{ValidJson, parse_path_id};
use crate::state::AppState;

use super::types::{Envelope, PermissionsData, RolesData};

/// GET /api/v1/advance/roles/permissions
async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Envelope<PermissionsData>, ApiError> {
    let permissions_by_module = state.catalog.list_modules_with_permissions().await?;

    Ok(Envelope::new(
        "PERMISSIONS_FETCHED",
        "Permissions fetched successfully",
        PermissionsData {
            permissions_by_module,
        },
    ))
}

/// POST /api/v1/advance/roles
async fn create_role(
    caller: AuthUser,
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateRole>,
) -> Result<(StatusCode, Envelope<Role>), ApiError> {
    let role = state.roles.create_role(request, Some(caller.id)).await?;

    info!("Role {} created by {}", role.name, caller.id);

    Ok((
        StatusCode::CREATED,
        Envelope::new("ROLES_CREATED", "Role created successfully", role),
    ))
}

/// GET /api/v1/advance/roles
async fn list_roles(State(state): State<AppState>) -> Result<Envelope<RolesData>, ApiError> {
    let roles = state.roles.list_roles().await?;

    Ok(Envelope::new(
        "ROLES_FETCHED",
        "Roles fetched successfully",
        RolesData {
            count: roles.len(),
            roles,
        },
    ))
}

/// GET /api/v1/advance/roles/dropdown
async fn dropdown(State(state): State<AppState>) -> Result<Envelope<Vec<RoleOption>>, ApiError> {
    let options = state.roles.list_role_options().await?;

    Ok(Envelope::new(
        "ROLES_FETCHED",
        "Roles fetched successfully",
        options,
    ))
}

/// GET /api/v1/advance/roles/{id}
async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Envelope<Role>, ApiError> {
    let role = state.roles.get_role(parse_path_id(&id)?).await?;

    Ok(Envelope::new("ROLE_FETCHED", "Role fetched successfully", role))
}

/// Create role routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/advance/roles", get(list_roles).post(create_role))
        .route("/advance/roles/permissions", get(list_permissions))
        .route("/advance/roles/dropdown", get(dropdown))
        .route("/advance/roles/{id}", get(get_role))
}
