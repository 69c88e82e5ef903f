//! SQLite persistence for the concierge caches
//!
//! Implements the `concierge-core` repository traits over a `sqlx` SQLite
//! pool: the credential store, the offline staff session cache, and the
//! per-hotel room snapshot cache, together with versioned migrations. All
//! three caches survive process restarts, which is what makes offline login
//! and offline room data possible.

pub mod migrations;
pub mod repositories;

pub use repositories::SqliteRepositoryProvider;
