//! Application state

use advance_auth::TokenManager;
use advance_core::{AccountManager, CoreError, PermissionCatalog, RoleManager};
use advance_db::Database;
use std::sync::Arc;

/// Handle used to render the Prometheus exposition
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenManager>,
    pub accounts: Arc<AccountManager>,
    pub roles: Arc<RoleManager>,
    pub catalog: Arc<PermissionCatalog>,
}

impl AppState {
    pub fn new(db: Database, tokens: Arc<TokenManager>) -> Result<Self, CoreError> {
        let accounts = Arc::new(AccountManager::new(db.clone(), tokens.clone())?);
        let roles = Arc::new(RoleManager::new(db.clone()));
        let catalog = Arc::new(PermissionCatalog::new(db.clone()));

        Ok(Self {
            db,
            tokens,
            accounts,
            roles,
            catalog,
        })
    }
}
