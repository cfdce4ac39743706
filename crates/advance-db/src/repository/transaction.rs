//! Transactional store operations
//!
//! Registration, user patches and role creation each read before they
//! write. Those reads and the write run on one `StoreTx` so the store's
//! transaction boundary, not an in-process lock, keeps them consistent.

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, Transaction};
use tracing::debug;

use crate::error::DbError;
use crate::models::{NewRole, NewUser, PermissionSelection, Role, UpdateUser, User};
use crate::repository::{ROLE_SELECT, USER_SELECT};
use crate::utils::{decode_selection, encode_selection};

/// An open store transaction
pub struct StoreTx {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTx {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    /// Commit every statement run on this transaction
    pub async fn commit(self) -> Result<(), DbError> {
        self.tx.commit().await?;
        Ok(())
    }

    // ==================== Reads ====================

    /// Whether `username` belongs to a user other than `exclude_id`
    pub async fn username_taken(
        &mut self,
        username: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id FROM "advance-users"
            WHERE username = ? AND (? IS NULL OR id <> ?)
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.is_some())
    }

    /// Whether a role with exactly this name exists
    pub async fn role_name_taken(&mut self, name: &str) -> Result<bool, DbError> {
        let row = sqlx::query("SELECT id FROM advanceRoles WHERE name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.is_some())
    }

    /// Current permission selection of a role, `None` if the role is missing
    pub async fn role_permissions(
        &mut self,
        role_id: i64,
    ) -> Result<Option<PermissionSelection>, DbError> {
        let row = sqlx::query("SELECT permissions FROM advanceRoles WHERE id = ?")
            .bind(role_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("permissions")?;
                Ok(Some(decode_selection(&raw)?))
            }
            None => Ok(None),
        }
    }

    /// Every permission code currently in the catalog
    pub async fn permission_codes(&mut self) -> Result<Vec<String>, DbError> {
        let rows = sqlx::query("SELECT code FROM advancePermissions ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        rows.iter()
            .map(|row| row.try_get("code").map_err(DbError::from))
            .collect()
    }

    /// Get a user by ID within the transaction
    pub async fn get_user_by_id(&mut self, id: i64) -> Result<Option<User>, DbError> {
        let sql = format!("{} WHERE u.id = ?", USER_SELECT);
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    // ==================== Writes ====================

    /// Insert a new user and return its id.
    ///
    /// A unique-constraint race on `username` surfaces as
    /// `DbError::Duplicate`; an insert touching no rows as
    /// `DbError::InsertFailed`.
    pub async fn insert_user(&mut self, user: &NewUser) -> Result<i64, DbError> {
        let now = Utc::now().to_rfc3339();
        let permissions = user.permissions.as_ref().map(encode_selection);

        let result = sqlx::query(
            r#"
            INSERT INTO "advance-users"
                (name, email, mobile_no, username, role_id, is_auto_property_assign,
                 password, permissions, status, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.mobile_no)
        .bind(&user.username)
        .bind(user.role_id)
        .bind(user.is_auto_property_assign)
        .bind(&user.password_hash)
        .bind(permissions)
        .bind(user.created_by)
        .bind(&now)
        .bind(&now)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(DbError::InsertFailed(format!(
                "user '{}' insert affected {} rows",
                user.username,
                result.rows_affected()
            )));
        }

        let id = result.last_insert_rowid();
        debug!("Inserted user {} with id {}", user.username, id);
        Ok(id)
    }

    /// Apply a partial update to a user.
    ///
    /// Returns `DbError::NotFound` when no user has this id.
    pub async fn update_user(&mut self, id: i64, update: &UpdateUser) -> Result<(), DbError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(r#"UPDATE "advance-users" SET "#);
        {
            let mut set = builder.separated(", ");
            set.push("updated_at = ").push_bind_unseparated(Utc::now().to_rfc3339());

            if let Some(name) = &update.name {
                set.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(email) = &update.email {
                set.push("email = ").push_bind_unseparated(email.clone());
            }
            if let Some(mobile_no) = &update.mobile_no {
                set.push("mobile_no = ").push_bind_unseparated(mobile_no.clone());
            }
            if let Some(username) = &update.username {
                set.push("username = ").push_bind_unseparated(username.clone());
            }
            if let Some(role_id) = update.role_id {
                set.push("role_id = ").push_bind_unseparated(role_id);
            }
            if let Some(flag) = update.is_auto_property_assign {
                set.push("is_auto_property_assign = ").push_bind_unseparated(flag);
            }
            if let Some(status) = update.status {
                set.push("status = ").push_bind_unseparated(status);
            }
            if let Some(permissions) = &update.permissions {
                set.push("permissions = ")
                    .push_bind_unseparated(encode_selection(permissions));
            }
        }
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(&mut *self.tx).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User: {}", id)));
        }
        Ok(())
    }

    /// Insert a new role and return the stored row
    pub async fn insert_role(&mut self, role: &NewRole) -> Result<Role, DbError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO advanceRoles (name, description, permissions, status, created_by, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?, ?)
            "#,
        )
        .bind(&role.name)
        .bind(&role.description)
        .bind(encode_selection(&role.permissions))
        .bind(role.created_by)
        .bind(&now)
        .bind(&now)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(DbError::InsertFailed(format!(
                "role '{}' insert affected {} rows",
                role.name,
                result.rows_affected()
            )));
        }

        let sql = format!("{} WHERE id = ?", ROLE_SELECT);
        let row = sqlx::query(&sql)
            .bind(result.last_insert_rowid())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(Role::try_from(&row)?)
    }
}
