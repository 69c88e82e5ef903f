//! Core functionality for the concierge project
//!
//! This crate contains the domain types and trait seams for an
//! offline-capable hotel staff authentication and caching client: the
//! in-memory [`AuthSession`], the persisted [`StaffSessionRecord`] used for
//! offline credential validation, the [`RoomSnapshot`] cache types, tenant
//! resolution helpers, and the repository and backend traits implemented by
//! the storage and transport crates.
//!
//! Application code is expected to use the `concierge` crate, which wires
//! these pieces into a coordinating service; this crate is the dependency of
//! storage backends and connectors.

pub mod backend;
pub mod crypto;
pub mod error;
pub mod events;
pub mod id;
pub mod repositories;
pub mod role;
pub mod room;
pub mod session;
pub mod staff;
pub mod tenant;
pub mod user;
pub mod validation;

pub use backend::{BackendConnector, LoginResponse, ProfileUpdate};
pub use error::Error;
pub use events::{SessionEvent, SessionEventBus, SessionEventHandler};
pub use repositories::RepositoryProvider;
pub use role::RoleSet;
pub use room::{HotelId, Room, RoomSnapshot};
pub use session::{AuthSession, AuthState, SessionToken};
pub use staff::StaffSessionRecord;
pub use tenant::{TenantContext, TenantDirectory, TenantId, TenantInfo};
pub use user::{UserId, UserProfile};
