//! Startup seeding: permission catalog and first administrator

use advance_api::AppState;
use advance_core::{CreateRole, Registration};
use advance_db::Database;
use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::config::{BootstrapAdminConfig, CatalogConfig};

/// Name of the role granted every catalog permission at bootstrap
const ADMIN_ROLE_NAME: &str = "Administrator";

/// Insert configured modules and permissions. Existing entries are left as
/// they are. Returns the number of newly inserted permissions.
pub async fn seed_catalog(db: &Database, catalog: &CatalogConfig) -> Result<usize> {
    let mut inserted = 0;

    for module in &catalog.modules {
        let module_id = db
            .ensure_module(&module.name)
            .await
            .with_context(|| format!("Failed to seed module {}", module.name))?;

        for permission in &module.permissions {
            if db
                .ensure_permission(module_id, &permission.code, &permission.name)
                .await
                .with_context(|| format!("Failed to seed permission {}", permission.code))?
            {
                debug!("Seeded permission {} under {}", permission.code, module.name);
                inserted += 1;
            }
        }
    }

    info!(
        "Permission catalog ready ({} modules configured, {} permissions added)",
        catalog.modules.len(),
        inserted
    );
    Ok(inserted)
}

/// Create the administrator role and user when no users exist yet.
/// Returns whether an account was created.
pub async fn bootstrap_admin(state: &AppState, admin: &BootstrapAdminConfig) -> Result<bool> {
    if !admin.enabled {
        return Ok(false);
    }
    if state.db.has_users().await? {
        debug!("Users already exist, skipping admin bootstrap");
        return Ok(false);
    }

    let role_id = match state.db.get_role_by_name(ADMIN_ROLE_NAME).await? {
        Some(role) => role.id,
        None => {
            let all: Map<String, Value> = state
                .db
                .list_permissions()
                .await?
                .into_iter()
                .map(|p| (p.code, Value::Bool(true)))
                .collect();

            state
                .roles
                .create_role(
                    CreateRole {
                        name: Some(ADMIN_ROLE_NAME.to_string()),
                        description: Some("Full access to every permission".to_string()),
                        permissions: Some(Value::Object(all)),
                    },
                    None,
                )
                .await
                .context("Failed to create administrator role")?
                .id
        }
    };

    let user = state
        .accounts
        .register(
            Registration {
                name: Some(admin.name.clone()),
                email: Some(admin.email.clone()),
                mobile_no: None,
                username: Some(admin.username.clone()),
                password: admin.password.clone(),
                role_id: Some(json!(role_id)),
                is_auto_property_assign: None,
            },
            None,
        )
        .await
        .context("Failed to create administrator account")?;

    info!("Bootstrap administrator created (username: {})", user.username);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use advance_auth::TokenManager;
    use std::sync::Arc;

    async fn state() -> AppState {
        let db = Database::in_memory().await.unwrap();
        let tokens = Arc::new(TokenManager::new("bootstrap-secret", 3600).unwrap());
        AppState::new(db, tokens).unwrap()
    }

    fn admin_config() -> BootstrapAdminConfig {
        BootstrapAdminConfig {
            enabled: true,
            password: Some("first-run-pass".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_seed_catalog_is_idempotent() {
        let state = state().await;
        let catalog = CatalogConfig::default();

        assert_eq!(seed_catalog(&state.db, &catalog).await.unwrap(), 5);
        assert_eq!(seed_catalog(&state.db, &catalog).await.unwrap(), 0);

        let modules = state.catalog.list_modules_with_permissions().await.unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].module, "Users");
        assert_eq!(modules[0].permissions.len(), 3);
        assert_eq!(modules[1].permissions.len(), 2);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_grants_everything() {
        let state = state().await;
        seed_catalog(&state.db, &CatalogConfig::default()).await.unwrap();

        assert!(bootstrap_admin(&state, &admin_config()).await.unwrap());

        let outcome = state.accounts.login("admin", "first-run-pass").await.unwrap();
        assert_eq!(outcome.user.role_name.as_deref(), Some(ADMIN_ROLE_NAME));
        let snapshot = outcome.user.permissions.unwrap();
        assert_eq!(snapshot.len(), 5);
        assert!(snapshot.values().all(|enabled| *enabled));

        // Second start finds existing users
        assert!(!bootstrap_admin(&state, &admin_config()).await.unwrap());
    }

    #[tokio::test]
    async fn test_bootstrap_disabled() {
        let state = state().await;
        let config = BootstrapAdminConfig::default();

        assert!(!bootstrap_admin(&state, &config).await.unwrap());
        assert!(!state.db.has_users().await.unwrap());
    }
}
