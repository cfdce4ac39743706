//! Configuration loading and validation

use advance_auth::{DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx SQLite connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token signing secret. Has no default; startup fails without one.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
    #[serde(default)]
    pub bootstrap_admin: BootstrapAdminConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: default_token_ttl_secs(),
            bootstrap_admin: BootstrapAdminConfig::default(),
        }
    }
}

/// First-run administrator account, created only while no users exist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdminConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_admin_name")]
    pub name: String,
    #[serde(default = "default_admin_email")]
    pub email: String,
}

impl Default for BootstrapAdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: default_admin_username(),
            password: None,
            name: default_admin_name(),
            email: default_admin_email(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// CORS configuration. An empty origin list allows any origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Permission catalog seeded at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<PermissionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionConfig {
    pub code: String,
    pub name: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let module = |name: &str, permissions: &[(&str, &str)]| ModuleConfig {
            name: name.to_string(),
            permissions: permissions
                .iter()
                .map(|(code, name)| PermissionConfig {
                    code: code.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        };

        Self {
            modules: vec![
                module(
                    "Users",
                    &[
                        ("USER_VIEW", "View users"),
                        ("USER_CREATE", "Create users"),
                        ("USER_EDIT", "Edit users"),
                    ],
                ),
                module(
                    "Roles",
                    &[("ROLE_VIEW", "View roles"), ("ROLE_CREATE", "Create roles")],
                ),
            ],
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_url() -> String {
    "sqlite://./data/advance.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_token_ttl_secs() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

fn default_admin_email() -> String {
    "admin@localhost".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Check the settings the service cannot start without
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret().is_none() {
            bail!("auth.jwt_secret is not configured (set it in the config file or ADVANCE_JWT_SECRET)");
        }
        if self.auth.token_ttl_secs <= 0 || self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!(
                "auth.token_ttl_secs must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_SECS,
                self.auth.token_ttl_secs
            );
        }
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be at least 1");
        }

        let admin = &self.auth.bootstrap_admin;
        if admin.enabled && admin.password.as_deref().is_none_or(|p| p.trim().is_empty()) {
            bail!("auth.bootstrap_admin.password is required when bootstrap is enabled");
        }

        let mut codes = HashSet::new();
        for module in &self.catalog.modules {
            if module.name.trim().is_empty() {
                bail!("catalog module names must not be empty");
            }
            for permission in &module.permissions {
                if permission.code.trim().is_empty() {
                    bail!("permission codes in module {} must not be empty", module.name);
                }
                if !codes.insert(permission.code.as_str()) {
                    bail!("permission code {} is declared more than once", permission.code);
                }
            }
        }
        if self.catalog.modules.is_empty() {
            warn!("No catalog modules configured; roles can only carry empty permission sets");
        }

        Ok(())
    }

    /// The configured signing secret, if any non-blank one is set
    pub fn jwt_secret(&self) -> Option<&str> {
        self.auth
            .jwt_secret
            .as_deref()
            .filter(|secret| !secret.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn path(file: &tempfile::NamedTempFile) -> &str {
        file.path().to_str().unwrap()
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let config = Config::load(missing.to_str().unwrap()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert!(config.auth.jwt_secret.is_none());
        assert_eq!(config.catalog.modules.len(), 2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config(
            r#"
[server]
port = 8081

[auth]
jwt_secret = "from-file"
token_ttl_secs = 900

[logging]
format = "json"

[[catalog.modules]]
name = "Reports"
permissions = [{ code = "REPORT_VIEW", name = "View reports" }]
"#,
        );

        let config = Config::load(path(&file)).unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.jwt_secret(), Some("from-file"));
        assert_eq!(config.auth.token_ttl_secs, 900);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.catalog.modules.len(), 1);
        assert_eq!(config.catalog.modules[0].permissions[0].code, "REPORT_VIEW");
        config.validate().unwrap();
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let file = write_config("[server\nport = ");
        assert!(Config::load(path(&file)).is_err());
    }

    #[test]
    fn test_validation_rules() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some("   ".to_string());
        assert!(config.validate().is_err());

        config.auth.jwt_secret = Some("secret".to_string());
        config.validate().unwrap();

        config.auth.token_ttl_secs = 0;
        assert!(config.validate().is_err());
        config.auth.token_ttl_secs = 10_000_000_000_000;
        assert!(config.validate().is_err());
        config.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        config.validate().unwrap();
        config.auth.token_ttl_secs = 60;

        config.auth.bootstrap_admin.enabled = true;
        assert!(config.validate().is_err());
        config.auth.bootstrap_admin.password = Some("change-me".to_string());
        config.validate().unwrap();

        config.catalog.modules[1].permissions[0].code = "USER_VIEW".to_string();
        assert!(config.validate().is_err());
    }
}
