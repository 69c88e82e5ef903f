//! Repository implementations for SQLite storage

pub mod credential;
pub mod room_snapshot;
pub mod staff_session;

pub use credential::SqliteCredentialRepository;
pub use room_snapshot::SqliteRoomSnapshotRepository;
pub use staff_session::SqliteStaffSessionRepository;

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::OnceCell;

use concierge_core::{
    Error,
    error::StorageError,
    repositories::{
        CredentialRepositoryProvider, RepositoryProvider, RoomSnapshotRepositoryProvider,
        StaffSessionRepositoryProvider,
    },
};

/// Repository provider implementation for SQLite.
///
/// Implements the individual repository provider traits as well as the
/// unified `RepositoryProvider` trait. `initialize` is deduplicated through
/// a [`OnceCell`]: concurrent callers all await the single in-flight
/// migration run, so only one underlying schema setup ever happens.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    credentials: Arc<SqliteCredentialRepository>,
    staff_sessions: Arc<SqliteStaffSessionRepository>,
    room_snapshots: Arc<SqliteRoomSnapshotRepository>,
    init: OnceCell<()>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let credentials = Arc::new(SqliteCredentialRepository::new(pool.clone()));
        let staff_sessions = Arc::new(SqliteStaffSessionRepository::new(pool.clone()));
        let room_snapshots = Arc::new(SqliteRoomSnapshotRepository::new(pool.clone()));

        Self {
            pool,
            credentials,
            staff_sessions,
            room_snapshots,
            init: OnceCell::new(),
        }
    }

    /// Open a pool and build a provider for the given SQLite URL
    /// (e.g. `sqlite://concierge.db?mode=rwc` or `sqlite::memory:`).
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = SqlitePool::connect(url).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to open SQLite database");
            Error::Storage(StorageError::Connection(e.to_string()))
        })?;
        Ok(Self::new(pool))
    }
}

impl CredentialRepositoryProvider for SqliteRepositoryProvider {
    type CredentialRepo = SqliteCredentialRepository;

    fn credentials(&self) -> &Self::CredentialRepo {
        &self.credentials
    }
}

impl StaffSessionRepositoryProvider for SqliteRepositoryProvider {
    type StaffSessionRepo = SqliteStaffSessionRepository;

    fn staff_sessions(&self) -> &Self::StaffSessionRepo {
        &self.staff_sessions
    }
}

impl RoomSnapshotRepositoryProvider for SqliteRepositoryProvider {
    type RoomSnapshotRepo = SqliteRoomSnapshotRepository;

    fn room_snapshots(&self) -> &Self::RoomSnapshotRepo {
        &self.room_snapshots
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn initialize(&self) -> Result<(), Error> {
        self.init
            .get_or_try_init(|| self.migrate())
            .await
            .map(|_| ())
    }

    async fn migrate(&self) -> Result<(), Error> {
        use crate::migrations::{SqliteMigrationManager, all_migrations};

        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&all_migrations()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn setup_provider() -> SqliteRepositoryProvider {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let provider = SqliteRepositoryProvider::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        provider
            .initialize()
            .await
            .expect("Failed to initialize provider");
        provider
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let provider = setup_provider().await;
        provider.initialize().await.unwrap();
        provider.initialize().await.unwrap();
        provider.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_initialize_runs_setup_once() {
        let provider = Arc::new(
            SqliteRepositoryProvider::connect("sqlite::memory:")
                .await
                .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.initialize().await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Exactly one migration run: every version recorded once.
        let manager =
            crate::migrations::SqliteMigrationManager::new(provider.pool.clone());
        let applied = manager.get_applied_migrations().await.unwrap();
        assert_eq!(applied.len(), crate::migrations::all_migrations().len());
    }
}
