//! User identity and the persisted user profile
//!
//! The profile is the slice of the backend's login response that the client
//! keeps beside the bearer token so a session can be rebuilt after a process
//! restart.

use serde::{Deserialize, Serialize};

use crate::{role::RoleSet, room::HotelId, tenant::TenantId};

/// A unique, stable identifier for a specific user.
/// Issued by the backend; treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user profile persisted by the credential store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,

    pub email: String,

    pub display_name: String,

    /// Ordered roles; the first is the primary role.
    pub roles: RoleSet,

    /// Absent for system-wide accounts.
    pub tenant_id: Option<TenantId>,

    pub hotel_id: Option<HotelId>,

    pub hotel_name: Option<String>,
}
