//! Module and permission catalog operations

use sqlx::Row;

use crate::error::DbError;
use crate::models::{CatalogRow, Permission};
use crate::repository::Database;

impl Database {
    // ==================== Catalog Operations ====================

    /// Modules LEFT JOIN permissions, ordered by module id then permission id.
    ///
    /// A module without permissions yields exactly one row whose permission
    /// columns are NULL.
    pub async fn list_catalog_rows(&self) -> Result<Vec<CatalogRow>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT am.id AS module_id, am.module_name,
                   ap.id AS permission_id, ap.code, ap.name AS permission_name
            FROM advanceModules AS am
            LEFT JOIN advancePermissions AS ap ON am.id = ap.module_id
            ORDER BY am.id, ap.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| CatalogRow::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// List every permission in the catalog
    pub async fn list_permissions(&self) -> Result<Vec<Permission>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, name, module_id
            FROM advancePermissions
            ORDER BY module_id, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Permission::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Insert a module if no module with this name exists; returns its id
    pub async fn ensure_module(&self, name: &str) -> Result<i64, DbError> {
        sqlx::query("INSERT OR IGNORE INTO advanceModules (module_name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query("SELECT id FROM advanceModules WHERE module_name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("id"))
    }

    /// Insert a permission if its code is not taken yet.
    ///
    /// Returns `true` when a row was inserted. An existing code keeps its
    /// original module and display name.
    pub async fn ensure_permission(
        &self,
        module_id: i64,
        code: &str,
        name: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO advancePermissions (module_id, code, name)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(module_id)
        .bind(code)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_rows_include_empty_modules() {
        let db = Database::in_memory().await.unwrap();

        let users = db.ensure_module("Users").await.unwrap();
        let roles = db.ensure_module("Roles").await.unwrap();
        let reports = db.ensure_module("Reports").await.unwrap();
        db.ensure_permission(users, "U_VIEW", "View users").await.unwrap();
        db.ensure_permission(roles, "R_VIEW", "View roles").await.unwrap();
        db.ensure_permission(users, "U_EDIT", "Edit users").await.unwrap();

        let rows = db.list_catalog_rows().await.unwrap();
        let summary: Vec<(i64, Option<String>)> =
            rows.iter().map(|r| (r.module_id, r.code.clone())).collect();
        assert_eq!(
            summary,
            vec![
                (users, Some("U_VIEW".to_string())),
                (users, Some("U_EDIT".to_string())),
                (roles, Some("R_VIEW".to_string())),
                (reports, None),
            ]
        );
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let db = Database::in_memory().await.unwrap();

        let first = db.ensure_module("Users").await.unwrap();
        let second = db.ensure_module("Users").await.unwrap();
        assert_eq!(first, second);

        assert!(db.ensure_permission(first, "U_VIEW", "View users").await.unwrap());
        assert!(!db.ensure_permission(first, "U_VIEW", "Renamed").await.unwrap());

        let permissions = db.list_permissions().await.unwrap();
        assert_eq!(permissions.len(), 1);
        assert_eq!(permissions[0].name, "View users");
    }
}
