//! Database models

use crate::utils::{decode_selection, parse_datetime_or_now};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::collections::BTreeMap;

/// Permission code -> enabled state, as attached to a role or snapshotted
/// onto a user. Ordered so the stored JSON is stable.
pub type PermissionSelection = BTreeMap<String, bool>;

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub mobile_no: String,
    pub username: String,
    pub role_id: Option<i64>,
    /// Joined from the roles table, not stored on the user row
    pub role_name: Option<String>,
    pub is_auto_property_assign: bool,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role permissions captured when the role was assigned
    pub permissions: Option<PermissionSelection>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub mobile_no: String,
    pub username: String,
    pub role_id: Option<i64>,
    pub is_auto_property_assign: bool,
    pub password_hash: String,
    pub permissions: Option<PermissionSelection>,
    pub created_by: Option<i64>,
}

/// Update user (for partial updates)
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile_no: Option<String>,
    pub username: Option<String>,
    pub role_id: Option<i64>,
    pub is_auto_property_assign: Option<bool>,
    pub status: Option<bool>,
    pub permissions: Option<PermissionSelection>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.mobile_no.is_none()
            && self.username.is_none()
            && self.role_id.is_none()
            && self.is_auto_property_assign.is_none()
            && self.status.is_none()
            && self.permissions.is_none()
    }
}

/// Role model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub permissions: PermissionSelection,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New role (for insertion)
#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
    pub permissions: PermissionSelection,
    pub created_by: Option<i64>,
}

/// Minimal role projection for selection lists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleOption {
    pub id: i64,
    pub name: String,
}

/// Permission module (a named group of permissions)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    pub id: i64,
    pub name: String,
}

/// Permission catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub module_id: i64,
}

/// One row of the modules LEFT JOIN permissions query.
///
/// The permission columns are all `None` for a module without permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub module_id: i64,
    pub module_name: String,
    pub permission_id: Option<i64>,
    pub code: Option<String>,
    pub permission_name: Option<String>,
}

// ==================== TryFrom Implementations ====================

fn decode_err(column: &str, err: serde_json::Error) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let permissions = row
            .try_get::<Option<String>, _>("permissions")?
            .filter(|raw| !raw.trim().is_empty() && raw.trim() != "null")
            .map(|raw| decode_selection(&raw))
            .transpose()
            .map_err(|e| decode_err("permissions", e))?;

        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            mobile_no: row.try_get::<Option<String>, _>("mobile_no")?.unwrap_or_default(),
            username: row.try_get("username")?,
            role_id: row.try_get("role_id")?,
            role_name: row.try_get("role_name")?,
            is_auto_property_assign: row.try_get("is_auto_property_assign")?,
            password_hash: row.try_get::<Option<String>, _>("password")?.unwrap_or_default(),
            permissions,
            status: row.try_get("status")?,
            created_by: row.try_get("created_by")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Role {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let raw: String = row.try_get("permissions")?;
        let permissions = decode_selection(&raw).map_err(|e| decode_err("permissions", e))?;

        Ok(Role {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            permissions,
            status: row.try_get("status")?,
            created_by: row.try_get("created_by")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for RoleOption {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(RoleOption {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Module {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Module {
            id: row.try_get("id")?,
            name: row.try_get("module_name")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Permission {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Permission {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            module_id: row.try_get("module_id")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for CatalogRow {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(CatalogRow {
            module_id: row.try_get("module_id")?,
            module_name: row.try_get("module_name")?,
            permission_id: row.try_get("permission_id")?,
            code: row.try_get("code")?,
            permission_name: row.try_get("permission_name")?,
        })
    }
}
