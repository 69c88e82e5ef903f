//! Repository traits for the persistence layer
//!
//! The caches this library maintains (credentials, staff sessions, room
//! snapshots) are defined as repository traits so the storage medium stays
//! an implementation choice. The trait hierarchy follows a composable
//! pattern:
//!
//! - Individual `*Repository` traits define the operations for each data
//!   domain
//! - Individual `*RepositoryProvider` traits provide access to each
//!   repository type
//! - [`RepositoryProvider`] is a supertrait combining all provider traits
//!   plus lifecycle methods

pub mod credential;
pub mod room_snapshot;
pub mod staff_session;

pub use credential::CredentialRepository;
pub use room_snapshot::RoomSnapshotRepository;
pub use staff_session::StaffSessionRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for credential repository access.
pub trait CredentialRepositoryProvider: Send + Sync + 'static {
    /// The credential repository implementation type
    type CredentialRepo: CredentialRepository;

    /// Get the credential repository
    fn credentials(&self) -> &Self::CredentialRepo;
}

/// Provider trait for staff session repository access.
pub trait StaffSessionRepositoryProvider: Send + Sync + 'static {
    /// The staff session repository implementation type
    type StaffSessionRepo: StaffSessionRepository;

    /// Get the staff session repository
    fn staff_sessions(&self) -> &Self::StaffSessionRepo;
}

/// Provider trait for room snapshot repository access.
pub trait RoomSnapshotRepositoryProvider: Send + Sync + 'static {
    /// The room snapshot repository implementation type
    type RoomSnapshotRepo: RoomSnapshotRepository;

    /// Get the room snapshot repository
    fn room_snapshots(&self) -> &Self::RoomSnapshotRepo;
}

/// Provider trait that storage implementations must implement to provide all
/// repositories, plus lifecycle methods for migrations and health checks.
///
/// `initialize` must be idempotent and safe under concurrent callers: every
/// caller resolves once the single underlying setup run completes.
#[async_trait]
pub trait RepositoryProvider:
    CredentialRepositoryProvider + StaffSessionRepositoryProvider + RoomSnapshotRepositoryProvider
{
    /// Idempotent, concurrency-safe setup of the underlying store.
    async fn initialize(&self) -> Result<(), Error>;

    /// Run migrations for all repositories.
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories.
    async fn health_check(&self) -> Result<(), Error>;
}
