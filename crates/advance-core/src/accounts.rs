//! User account management: registration, login and patches

use advance_auth::{hash_password, verify_password, AuthError, TokenManager};
use advance_db::{Database, DbError, NewUser, StoreTx, UpdateUser, User};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::CoreError;
use crate::input::{is_blank, normalize_flag, parse_flag, parse_optional_id};

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

/// Registration input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Number or numeric string
    #[serde(default)]
    pub role_id: Option<Value>,
    /// Any boolean-like value
    #[serde(default)]
    pub is_auto_property_assign: Option<Value>,
}

/// Partial user update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role_id: Option<Value>,
    #[serde(default)]
    pub is_auto_property_assign: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

/// Registers, authenticates and updates user accounts
#[derive(Clone)]
pub struct AccountManager {
    db: Database,
    tokens: Arc<TokenManager>,
    /// Verified against when the username is unknown, so both failure paths
    /// cost one hash verification
    dummy_hash: String,
}

impl AccountManager {
    pub fn new(db: Database, tokens: Arc<TokenManager>) -> Result<Self, CoreError> {
        let dummy_hash = hash_password("advance-access-login-guard")?;
        Ok(Self {
            db,
            tokens,
            dummy_hash,
        })
    }

    /// Register a user.
    ///
    /// The duplicate check, the role permission snapshot and the insert run
    /// in one store transaction.
    pub async fn register(
        &self,
        registration: Registration,
        created_by: Option<i64>,
    ) -> Result<User, CoreError> {
        if is_blank(registration.name.as_deref())
            || is_blank(registration.email.as_deref())
            || is_blank(registration.username.as_deref())
            || is_blank(registration.password.as_deref())
        {
            return Err(CoreError::InvalidInput(
                "name, email, username and password are required".to_string(),
            ));
        }

        let username = registration.username.unwrap_or_default();
        let password = registration.password.unwrap_or_default();
        validate_username(&username)?;
        validate_password(&password)?;

        let role_id = parse_optional_id(registration.role_id.as_ref(), "role_id")?;
        let is_auto_property_assign = normalize_flag(registration.is_auto_property_assign.as_ref());

        debug!("Registering user: {}", username);

        let password_hash = hash_password(&password)?;

        let mut tx = self.db.begin().await?;

        if tx.username_taken(&username, None).await? {
            return Err(CoreError::DuplicateUsername(username));
        }

        let permissions = match role_id {
            Some(role_id) => Some(snapshot_role(&mut tx, role_id).await?),
            None => None,
        };

        let new_user = NewUser {
            name: registration.name.unwrap_or_default(),
            email: registration.email.unwrap_or_default(),
            mobile_no: registration.mobile_no.unwrap_or_default(),
            username: username.clone(),
            role_id,
            is_auto_property_assign,
            password_hash,
            permissions,
            created_by,
        };

        let id = tx
            .insert_user(&new_user)
            .await
            .map_err(|e| duplicate_username(e, &username))?;
        let user = tx
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| CoreError::InsertFailed(format!("user {} not readable after insert", id)))?;
        tx.commit().await?;

        metrics::counter!("advance_users_registered_total").increment(1);
        info!("Registered user {} (id {})", user.username, user.id);
        Ok(user)
    }

    /// Authenticate a user and issue a token.
    ///
    /// Unknown usernames, wrong passwords and inactive accounts all fail with
    /// `InvalidCredentials`; only the log line tells them apart.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, CoreError> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "username and password are required".to_string(),
            ));
        }
        if username.chars().count() > MAX_USERNAME_LENGTH
            || password.chars().count() > MAX_PASSWORD_LENGTH
        {
            return Err(CoreError::InvalidInput(
                "username or password exceeds maximum length".to_string(),
            ));
        }

        debug!("Login attempt for user: {}", username);

        let user = match self.db.get_user_by_username(username).await? {
            Some(user) => user,
            None => {
                // Keep the unknown-user path as slow as a real verification
                let _ = verify_password(password, &self.dummy_hash);
                warn!("Login failed for {}: unknown username", username);
                metrics::counter!("advance_logins_total", "outcome" => "unknown_user").increment(1);
                return Err(CoreError::InvalidCredentials);
            }
        };

        if user.password_hash.trim().is_empty() {
            error!("User record {} has no password hash", user.id);
            return Err(CoreError::DataCorrupt(
                "User record missing password hash".to_string(),
            ));
        }

        let matched = match verify_password(password, &user.password_hash) {
            Ok(matched) => matched,
            Err(AuthError::CorruptDigest(detail)) => {
                error!("User record {} has a corrupt password hash: {}", user.id, detail);
                return Err(CoreError::DataCorrupt(
                    "User record has an unreadable password hash".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        if !matched {
            warn!("Login failed for {}: password mismatch", username);
            metrics::counter!("advance_logins_total", "outcome" => "bad_password").increment(1);
            return Err(CoreError::InvalidCredentials);
        }

        if !user.status {
            warn!("Login failed for {}: account inactive", username);
            metrics::counter!("advance_logins_total", "outcome" => "inactive").increment(1);
            return Err(CoreError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;

        metrics::counter!("advance_logins_total", "outcome" => "success").increment(1);
        info!("User {} logged in successfully", user.username);

        Ok(LoginOutcome {
            token,
            expires_in: self.tokens.ttl_secs(),
            user,
        })
    }

    /// Apply a partial update to a user.
    ///
    /// A changed username is re-checked for uniqueness and a given role is
    /// re-snapshotted. Either every change commits or none does.
    pub async fn patch(&self, id: i64, patch: UserPatch) -> Result<User, CoreError> {
        for (field, value) in [
            ("name", &patch.name),
            ("email", &patch.email),
            ("username", &patch.username),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(CoreError::InvalidInput(format!("{} must not be blank", field)));
            }
        }
        if let Some(username) = &patch.username {
            validate_username(username)?;
        }

        let mut update = UpdateUser {
            name: patch.name,
            email: patch.email,
            mobile_no: patch.mobile_no,
            username: patch.username,
            role_id: parse_optional_id(patch.role_id.as_ref(), "role_id")?,
            is_auto_property_assign: patch
                .is_auto_property_assign
                .as_ref()
                .map(|v| normalize_flag(Some(v))),
            status: patch
                .status
                .as_ref()
                .map(|v| {
                    parse_flag(v).ok_or_else(|| {
                        CoreError::InvalidInput(format!("status must be boolean-like, got {}", v))
                    })
                })
                .transpose()?,
            permissions: None,
        };
        if update.is_empty() {
            return Err(CoreError::InvalidInput("no updatable fields given".to_string()));
        }

        debug!("Updating user: {}", id);

        let mut tx = self.db.begin().await?;

        let existing = tx
            .get_user_by_id(id)
            .await?
            .ok_or(CoreError::UserNotFound(id))?;

        if let Some(username) = &update.username
            && *username != existing.username
            && tx.username_taken(username, Some(id)).await?
        {
            return Err(CoreError::DuplicateUsername(username.clone()));
        }

        if let Some(role_id) = update.role_id {
            update.permissions = Some(snapshot_role(&mut tx, role_id).await?);
        }

        let attempted = update.username.clone().unwrap_or_default();
        tx.update_user(id, &update).await.map_err(|e| match e {
            DbError::NotFound(_) => CoreError::UserNotFound(id),
            other => duplicate_username(other, &attempted),
        })?;

        let user = tx
            .get_user_by_id(id)
            .await?
            .ok_or(CoreError::UserNotFound(id))?;
        tx.commit().await?;

        info!("Updated user {} (id {})", user.username, user.id);
        Ok(user)
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>, CoreError> {
        Ok(self.db.list_users().await?)
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: i64) -> Result<User, CoreError> {
        self.db
            .get_user_by_id(id)
            .await?
            .ok_or(CoreError::UserNotFound(id))
    }
}

/// Copy a role's current permission selection for attaching to a user
async fn snapshot_role(
    tx: &mut StoreTx,
    role_id: i64,
) -> Result<advance_db::PermissionSelection, CoreError> {
    tx.role_permissions(role_id)
        .await
        .map_err(CoreError::from_role_read)?
        .ok_or_else(|| CoreError::InvalidInput(format!("Role {} does not exist", role_id)))
}

fn duplicate_username(err: DbError, username: &str) -> CoreError {
    match err {
        DbError::Duplicate(_) => CoreError::DuplicateUsername(username.to_string()),
        other => other.into(),
    }
}

fn validate_username(username: &str) -> Result<(), CoreError> {
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(CoreError::InvalidInput(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(CoreError::InvalidInput(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
