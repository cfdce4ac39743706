//! Permission catalog aggregation
//!
//! Folds the flat modules LEFT JOIN permissions rows into a module ->
//! permissions tree.

use advance_db::{CatalogRow, Database};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::CoreError;

/// A permission as listed under its module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionEntry {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// A module and the permissions it groups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModulePermissions {
    pub module: String,
    pub permissions: Vec<PermissionEntry>,
}

/// Fold catalog rows into one entry per module.
///
/// Modules keep first-seen order and permissions keep row order. A module id
/// seen again later, even after other modules, is merged into its existing
/// entry. Rows without a permission only register their module.
pub fn fold_catalog<I>(rows: I) -> Vec<ModulePermissions>
where
    I: IntoIterator<Item = CatalogRow>,
{
    let mut result: Vec<ModulePermissions> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let slot = *index.entry(row.module_id).or_insert_with(|| {
            result.push(ModulePermissions {
                module: row.module_name.clone(),
                permissions: Vec::new(),
            });
            result.len() - 1
        });

        if let (Some(id), Some(code)) = (row.permission_id, row.code) {
            result[slot].permissions.push(PermissionEntry {
                id,
                code,
                name: row.permission_name.unwrap_or_default(),
            });
        }
    }

    result
}

/// Read side of the module/permission catalog
#[derive(Clone)]
pub struct PermissionCatalog {
    db: Database,
}

impl PermissionCatalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Every module with its permissions, modules by id ascending
    pub async fn list_modules_with_permissions(&self) -> Result<Vec<ModulePermissions>, CoreError> {
        let rows = self.db.list_catalog_rows().await?;
        let row_count = rows.len();
        let modules = fold_catalog(rows);
        debug!("Folded {} catalog rows into {} modules", row_count, modules.len());
        Ok(modules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(module_id: i64, module: &str, permission: Option<(i64, &str)>) -> CatalogRow {
        CatalogRow {
            module_id,
            module_name: module.to_string(),
            permission_id: permission.map(|(id, _)| id),
            code: permission.map(|(_, code)| code.to_string()),
            permission_name: permission.map(|(_, code)| format!("{} name", code)),
        }
    }

    fn codes(module: &ModulePermissions) -> Vec<&str> {
        module.permissions.iter().map(|p| p.code.as_str()).collect()
    }

    #[test]
    fn test_fold_groups_by_module() {
        let modules = fold_catalog(vec![
            row(1, "Users", Some((1, "U_VIEW"))),
            row(1, "Users", Some((2, "U_EDIT"))),
            row(2, "Roles", Some((3, "R_VIEW"))),
        ]);

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].module, "Users");
        assert_eq!(codes(&modules[0]), vec!["U_VIEW", "U_EDIT"]);
        assert_eq!(modules[1].module, "Roles");
        assert_eq!(codes(&modules[1]), vec!["R_VIEW"]);
        assert_eq!(modules[0].permissions[0].id, 1);
        assert_eq!(modules[0].permissions[0].name, "U_VIEW name");
    }

    #[test]
    fn test_empty_module_is_kept() {
        let modules = fold_catalog(vec![
            row(1, "Users", Some((1, "U_VIEW"))),
            row(2, "Reports", None),
        ]);

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[1].module, "Reports");
        assert!(modules[1].permissions.is_empty());
    }

    #[test]
    fn test_interleaved_rows_do_not_duplicate_modules() {
        let modules = fold_catalog(vec![
            row(1, "Users", Some((1, "U_VIEW"))),
            row(2, "Roles", Some((3, "R_VIEW"))),
            row(1, "Users", Some((2, "U_EDIT"))),
        ]);

        assert_eq!(modules.len(), 2);
        assert_eq!(codes(&modules[0]), vec!["U_VIEW", "U_EDIT"]);
        assert_eq!(codes(&modules[1]), vec!["R_VIEW"]);
    }

    #[test]
    fn test_fold_empty() {
        assert!(fold_catalog(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_catalog_from_store() {
        let db = Database::in_memory().await.unwrap();
        let users = db.ensure_module("Users").await.unwrap();
        let roles = db.ensure_module("Roles").await.unwrap();
        db.ensure_module("Reports").await.unwrap();
        db.ensure_permission(users, "U_VIEW", "View users").await.unwrap();
        db.ensure_permission(users, "U_EDIT", "Edit users").await.unwrap();
        db.ensure_permission(roles, "R_VIEW", "View roles").await.unwrap();

        let catalog = PermissionCatalog::new(db);
        let modules = catalog.list_modules_with_permissions().await.unwrap();

        let summary: Vec<(&str, Vec<&str>)> = modules
            .iter()
            .map(|m| (m.module.as_str(), codes(m)))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Users", vec!["U_VIEW", "U_EDIT"]),
                ("Roles", vec!["R_VIEW"]),
                ("Reports", vec![]),
            ]
        );
    }
}
