//! Role management

use advance_db::{Database, DbError, NewRole, PermissionSelection, Role, RoleOption};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::input::{is_blank, normalize_flag};

/// Input for creating a role
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRole {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Object of permission code -> boolean-like enabled state
    #[serde(default)]
    pub permissions: Option<Value>,
}

/// Creates and reads roles
#[derive(Clone)]
pub struct RoleManager {
    db: Database,
}

impl RoleManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a role.
    ///
    /// The name must not match an existing role exactly (case-sensitive) and
    /// every permission code must exist in the catalog at creation time.
    pub async fn create_role(
        &self,
        input: CreateRole,
        created_by: Option<i64>,
    ) -> Result<Role, CoreError> {
        if is_blank(input.name.as_deref()) {
            return Err(CoreError::InvalidInput("name is required".to_string()));
        }
        let name = input.name.unwrap_or_default().trim().to_string();
        let description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let requested = selection_from_value(input.permissions.as_ref())?;

        debug!("Creating role: {}", name);

        let mut tx = self.db.begin().await?;

        if tx.role_name_taken(&name).await? {
            return Err(CoreError::DuplicateRoleName(name));
        }

        let known: HashSet<String> = tx.permission_codes().await?.into_iter().collect();
        let unknown: Vec<&str> = requested
            .keys()
            .filter(|code| !known.contains(code.as_str()))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            warn!("Role {} rejected, unknown permission codes: {:?}", name, unknown);
            return Err(CoreError::InvalidInput(format!(
                "Unknown permission codes: {}",
                unknown.join(", ")
            )));
        }

        let role = tx
            .insert_role(&NewRole {
                name: name.clone(),
                description,
                permissions: requested,
                created_by,
            })
            .await
            .map_err(|e| match e {
                DbError::Duplicate(_) => CoreError::DuplicateRoleName(name.clone()),
                other => CoreError::from_role_read(other),
            })?;
        tx.commit().await?;

        metrics::counter!("advance_roles_created_total").increment(1);
        info!("Created role {} (id {})", role.name, role.id);
        Ok(role)
    }

    /// List all roles
    pub async fn list_roles(&self) -> Result<Vec<Role>, CoreError> {
        self.db.list_roles().await.map_err(CoreError::from_role_read)
    }

    /// List roles as `{id, name}` pairs for selection lists
    pub async fn list_role_options(&self) -> Result<Vec<RoleOption>, CoreError> {
        Ok(self.db.list_role_options().await?)
    }

    /// Get a role by ID
    pub async fn get_role(&self, id: i64) -> Result<Role, CoreError> {
        self.db
            .get_role_by_id(id)
            .await
            .map_err(CoreError::from_role_read)?
            .ok_or(CoreError::RoleNotFound(id))
    }
}

/// Turn the request's permission object into a validated selection shape.
///
/// Missing or `null` means an empty selection; any other non-object is
/// invalid input.
fn selection_from_value(value: Option<&Value>) -> Result<PermissionSelection, CoreError> {
    match value {
        None | Some(Value::Null) => Ok(PermissionSelection::new()),
        Some(Value::Object(map)) => {
            let mut selection = PermissionSelection::new();
            for (code, state) in map {
                let code = code.trim();
                if code.is_empty() {
                    return Err(CoreError::InvalidInput(
                        "permission codes must not be blank".to_string(),
                    ));
                }
                selection.insert(code.to_string(), normalize_flag(Some(state)));
            }
            Ok(selection)
        }
        Some(_) => Err(CoreError::InvalidInput(
            "permissions must be an object of permission code to enabled state".to_string(),
        )),
    }
}
