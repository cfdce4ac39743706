//! User read operations

use sqlx::Row;

use crate::error::DbError;
use crate::models::User;
use crate::repository::{Database, USER_SELECT};

impl Database {
    // ==================== User Operations ====================

    /// Get a user by username (exact, case-sensitive match)
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let sql = format!("{} WHERE u.username = ? LIMIT 1", USER_SELECT);
        let result = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let sql = format!("{} WHERE u.id = ?", USER_SELECT);
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let sql = format!("{} ORDER BY u.id", USER_SELECT);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query(r#"SELECT COUNT(*) as count FROM "advance-users""#)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}
