//! Role sets and the hotel-staff / system-wide role partitions
//!
//! Roles arrive from the backend as an ordered list of strings; the first
//! entry is the account's primary role for display purposes. Two fixed
//! partitions matter to this library:
//!
//! - hotel-staff roles participate in offline login fallback
//! - system-wide roles mark accounts not bound to any tenant

use serde::{Deserialize, Serialize};

/// Roles eligible for offline login fallback.
pub const HOTEL_STAFF_ROLES: &[&str] = &[
    "HOTEL_ADMIN",
    "FRONTDESK",
    "HOUSEKEEPING",
    "OPERATIONS_SUPERVISOR",
];

/// Roles that mark an account as system-wide when no tenant is bound.
pub const SYSTEM_WIDE_ROLES: &[&str] = &["SYSTEM_ADMIN", "ADMIN", "GUEST", "CUSTOMER"];

/// An ordered set of role names. The first role is the primary role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct RoleSet(Vec<String>);

impl RoleSet {
    pub fn new(roles: Vec<String>) -> Self {
        RoleSet(roles)
    }

    /// The primary role, used for display. `None` only for an empty set.
    pub fn primary(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.iter().any(|r| r == role)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// True if any role is in the hotel-staff set. Only such accounts get a
    /// cached staff session record and may log in offline.
    pub fn is_hotel_staff(&self) -> bool {
        self.0.iter().any(|r| HOTEL_STAFF_ROLES.contains(&r.as_str()))
    }

    /// True if any role is in the system-wide set.
    pub fn intersects_system_wide(&self) -> bool {
        self.0.iter().any(|r| SYSTEM_WIDE_ROLES.contains(&r.as_str()))
    }
}

impl From<Vec<String>> for RoleSet {
    fn from(roles: Vec<String>) -> Self {
        RoleSet(roles)
    }
}

impl<const N: usize> From<[&str; N]> for RoleSet {
    fn from(roles: [&str; N]) -> Self {
        RoleSet(roles.iter().map(|r| r.to_string()).collect())
    }
}
