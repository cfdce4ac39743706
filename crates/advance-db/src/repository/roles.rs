//! Role read operations

use crate::error::DbError;
use crate::models::{Role, RoleOption};
use crate::repository::{Database, ROLE_SELECT};

impl Database {
    // ==================== Role Operations ====================

    /// List all roles
    pub async fn list_roles(&self) -> Result<Vec<Role>, DbError> {
        let sql = format!("{} ORDER BY id", ROLE_SELECT);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| Role::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// List roles as `{id, name}` pairs
    pub async fn list_role_options(&self) -> Result<Vec<RoleOption>, DbError> {
        let rows = sqlx::query("SELECT id, name FROM advanceRoles ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| RoleOption::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get a role by ID
    pub async fn get_role_by_id(&self, id: i64) -> Result<Option<Role>, DbError> {
        let sql = format!("{} WHERE id = ?", ROLE_SELECT);
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| Role::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a role by exact name
    pub async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>, DbError> {
        let sql = format!("{} WHERE name = ? LIMIT 1", ROLE_SELECT);
        let result = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| Role::try_from(&row).map_err(DbError::from)).transpose()
    }
}
