//! The seam to the REST backend
//!
//! [`BackendConnector`] abstracts the four server round-trips this library
//! performs. The auth orchestrator treats every connector error as "maybe
//! offline" for login and falls back to the offline session cache; other
//! operations surface the error to the caller.

use async_trait::async_trait;

use crate::{
    Error,
    role::RoleSet,
    room::{HotelId, Room},
    session::SessionToken,
    tenant::TenantId,
    user::{UserId, UserProfile},
};

/// The backend's answer to a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: RoleSet,
    pub tenant_id: Option<TenantId>,
    pub hotel_id: Option<HotelId>,
    pub hotel_name: Option<String>,
    pub token: SessionToken,
}

impl LoginResponse {
    /// "First Last", trimmed; empty when the backend sent neither.
    pub fn display_name(&self) -> String {
        let mut name = String::new();
        if let Some(first) = &self.first_name {
            name.push_str(first);
        }
        if let Some(last) = &self.last_name {
            if !name.is_empty() {
                name.push(' ');
            }
            name.push_str(last);
        }
        name.trim().to_string()
    }
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Typed HTTP operations against the hotel management backend.
///
/// Implementations perform network I/O only; no local persistence.
#[async_trait]
pub trait BackendConnector: Send + Sync + 'static {
    /// POST credentials to the login endpoint.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, Error>;

    /// Fetch the full room listing for a hotel.
    async fn fetch_rooms(
        &self,
        token: &SessionToken,
        tenant_id: Option<&TenantId>,
        hotel_id: &HotelId,
    ) -> Result<Vec<Room>, Error>;

    /// Update the authenticated user's profile. No offline fallback.
    async fn update_profile(
        &self,
        token: &SessionToken,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, Error>;

    /// Change the authenticated user's password. No offline fallback.
    async fn change_password(
        &self,
        token: &SessionToken,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error>;
}
