//! Versioned schema migrations for the SQLite caches
//!
//! Migrations are applied in version order inside transactions and recorded
//! in a `_concierge_migrations` table, so repeated initialization is a
//! no-op.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Database, Sqlite, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Migration: Send + Sync {
    /// Unique version number for ordering migrations
    fn version(&self) -> i64;

    /// Human readable name of the migration
    fn name(&self) -> &str;

    /// Execute the migration
    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError>;

    /// Rollback the migration
    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError>;
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    #[allow(dead_code)]
    pub applied_at: i64,
}

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn table_name(&self) -> &str {
        "_concierge_migrations"
    }

    /// Initialize migration tracking table
    pub async fn initialize(&self) -> Result<(), MigrationError> {
        sqlx::query(
            format!(
                r#"
            CREATE TABLE IF NOT EXISTS {} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
                self.table_name()
            )
            .as_str(),
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply pending migrations
    pub async fn up(&self, migrations: &[Box<dyn Migration>]) -> Result<(), MigrationError> {
        for migration in migrations {
            if !self.is_applied(migration.version()).await? {
                let mut tx = self.pool.begin().await?;

                tracing::info!(
                    "Applying migration {} ({})",
                    migration.name(),
                    migration.version()
                );

                migration
                    .up(&mut *tx as &mut <Sqlite as Database>::Connection)
                    .await?;

                sqlx::query(
                    format!(
                        "INSERT INTO {} (version, name, applied_at) VALUES (?, ?, ?)",
                        self.table_name()
                    )
                    .as_str(),
                )
                .bind(migration.version())
                .bind(migration.name())
                .bind(Utc::now().timestamp())
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;
            }
        }
        Ok(())
    }

    /// Get list of applied migrations
    pub async fn get_applied_migrations(&self) -> Result<Vec<MigrationRecord>, MigrationError> {
        let records = sqlx::query_as::<_, MigrationRecord>(
            format!(
                "SELECT version, name, applied_at FROM {}",
                self.table_name()
            )
            .as_str(),
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Check if specific migration was applied
    pub async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let result: bool = sqlx::query_scalar(
            format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE version = ?)",
                self.table_name()
            )
            .as_str(),
        )
        .bind(version)
        .fetch_one(&self.pool)
        .await?;
        Ok(result)
    }
}

pub struct CreateCredentialsTable;

#[async_trait]
impl Migration for CreateCredentialsTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "CreateCredentialsTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS credentials")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateStaffSessionsTable;

#[async_trait]
impl Migration for CreateStaffSessionsTable {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "CreateStaffSessionsTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS staff_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                username TEXT NOT NULL,
                email TEXT NOT NULL,
                roles TEXT NOT NULL,
                hotel_id TEXT,
                hotel_name TEXT,
                tenant_id TEXT,
                token TEXT NOT NULL,
                password_verifier TEXT,
                expires_at INTEGER NOT NULL,
                last_activity INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS staff_sessions")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateRoomSnapshotsTable;

#[async_trait]
impl Migration for CreateRoomSnapshotsTable {
    fn version(&self) -> i64 {
        3
    }

    fn name(&self) -> &str {
        "CreateRoomSnapshotsTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS room_snapshots (
                hotel_id TEXT NOT NULL,
                room_id TEXT NOT NULL,
                room_number TEXT NOT NULL,
                room_type TEXT NOT NULL,
                price_per_night REAL NOT NULL,
                capacity INTEGER NOT NULL,
                description TEXT,
                status TEXT NOT NULL,
                fetched_at INTEGER NOT NULL,
                PRIMARY KEY (hotel_id, room_id)
            );
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS room_snapshots")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateIndexes;

#[async_trait]
impl Migration for CreateIndexes {
    fn version(&self) -> i64 {
        4
    }

    fn name(&self) -> &str {
        "CreateIndexes"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_staff_sessions_email
                ON staff_sessions (email, last_activity DESC);
            "#,
        )
        .execute(&mut *conn)
        .await?;
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_staff_sessions_active
                ON staff_sessions (is_active);
            "#,
        )
        .execute(&mut *conn)
        .await?;
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_room_snapshots_hotel
                ON room_snapshots (hotel_id);
            "#,
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    async fn down<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query("DROP INDEX IF EXISTS idx_staff_sessions_email")
            .execute(&mut *conn)
            .await?;
        sqlx::query("DROP INDEX IF EXISTS idx_staff_sessions_active")
            .execute(&mut *conn)
            .await?;
        sqlx::query("DROP INDEX IF EXISTS idx_room_snapshots_hotel")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

/// All migrations in version order.
pub fn all_migrations() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(CreateCredentialsTable),
        Box::new(CreateStaffSessionsTable),
        Box::new(CreateRoomSnapshotsTable),
        Box::new(CreateIndexes),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_apply_once() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let manager = SqliteMigrationManager::new(pool.clone());
        manager.initialize().await.unwrap();

        manager.up(&all_migrations()).await.unwrap();
        // Applying again is a no-op.
        manager.up(&all_migrations()).await.unwrap();

        let applied = manager.get_applied_migrations().await.unwrap();
        assert_eq!(applied.len(), all_migrations().len());
        assert!(manager.is_applied(1).await.unwrap());
        assert!(!manager.is_applied(99).await.unwrap());
    }
}
