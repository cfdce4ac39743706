//! Database repository implementation

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::DbError;

// Submodules
mod catalog;
mod roles;
mod transaction;
mod users;

pub use transaction::StoreTx;

/// How long a writer waits for another writer's lock before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Columns selected for every user read, with the role name joined in.
pub(crate) const USER_SELECT: &str = r#"
    SELECT u.id, u.name, u.email, u.mobile_no, u.username, u.role_id,
           r.name AS role_name, u.is_auto_property_assign, u.password,
           u.permissions, u.status, u.created_by, u.created_at, u.updated_at
    FROM "advance-users" AS u
    LEFT JOIN advanceRoles AS r ON r.id = u.role_id
"#;

/// Columns selected for every role read.
pub(crate) const ROLE_SELECT: &str = r#"
    SELECT id, name, description, permissions, status, created_by, created_at, updated_at
    FROM advanceRoles
"#;

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection pool and run migrations
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, DbError> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Create an in-memory database, mainly for tests
    pub async fn in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // Every in-memory connection is its own database, so keep exactly one alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Round-trip a trivial query to confirm the store answers
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get the underlying pool for advanced usage
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a write transaction.
    ///
    /// Reads and writes that must succeed or fail together go through the
    /// returned handle; dropping it without `commit` rolls everything back.
    /// The write lock is taken up front (`BEGIN IMMEDIATE`), so a concurrent
    /// writer waits on the busy timeout and then sees the committed row
    /// instead of failing to upgrade a read lock.
    pub async fn begin(&self) -> Result<StoreTx, DbError> {
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(StoreTx::new(tx))
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS advanceModules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module_name TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS advancePermissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module_id INTEGER NOT NULL REFERENCES advanceModules(id),
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_advance_permissions_module ON advancePermissions(module_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS advanceRoles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                permissions TEXT NOT NULL DEFAULT '{}',
                status INTEGER NOT NULL DEFAULT 1,
                created_by INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS "advance-users" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                mobile_no TEXT NOT NULL DEFAULT '',
                username TEXT NOT NULL UNIQUE,
                role_id INTEGER REFERENCES advanceRoles(id),
                is_auto_property_assign INTEGER NOT NULL DEFAULT 0,
                password TEXT NOT NULL,
                permissions TEXT,
                status INTEGER NOT NULL DEFAULT 1,
                created_by INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_advance_users_role ON "advance-users"(role_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }
}
