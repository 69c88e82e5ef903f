//! Session state
//!
//! This module contains the in-memory authenticated session and the login
//! state machine states. A session exists from a successful login (online or
//! offline) until logout or a session-expired signal; it is exclusively
//! owned by the auth orchestrator, which hands out clones as read-only
//! views.

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::ValidationError,
    role::RoleSet,
    room::HotelId,
    tenant::TenantId,
    user::{UserId, UserProfile},
};

/// An opaque bearer credential issued by the backend.
///
/// The client never mints or verifies these; it stores, replays, and (for
/// tenant resolution) leniently inspects them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: &str) -> Self {
        SessionToken(token.to_string())
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The in-memory authenticated session.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    /// The unique identifier for the user.
    pub user_id: UserId,

    pub email: String,

    pub display_name: String,

    /// Ordered roles; the first is the primary role for display.
    pub roles: RoleSet,

    /// `None` for system-wide accounts.
    pub tenant_id: Option<TenantId>,

    pub hotel_id: Option<HotelId>,

    pub hotel_name: Option<String>,

    /// The opaque bearer credential for authenticated calls.
    pub token: SessionToken,
}

impl AuthSession {
    pub fn builder() -> AuthSessionBuilder {
        AuthSessionBuilder::default()
    }

    /// Derived, never stored: a session is system-wide when it has no tenant
    /// binding and carries at least one system-wide role.
    pub fn is_system_wide(&self) -> bool {
        self.tenant_id.is_none() && self.roles.intersects_system_wide()
    }

    /// Exactly one of system-wide / tenant-bound holds at any time.
    pub fn is_tenant_bound(&self) -> bool {
        self.tenant_id.is_some()
    }

    /// The profile slice persisted by the credential store.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.user_id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            roles: self.roles.clone(),
            tenant_id: self.tenant_id.clone(),
            hotel_id: self.hotel_id.clone(),
            hotel_name: self.hotel_name.clone(),
        }
    }

    /// Rebuild a session from a persisted profile and token.
    pub fn from_profile(profile: UserProfile, token: SessionToken) -> Self {
        AuthSession {
            user_id: profile.id,
            email: profile.email,
            display_name: profile.display_name,
            roles: profile.roles,
            tenant_id: profile.tenant_id,
            hotel_id: profile.hotel_id,
            hotel_name: profile.hotel_name,
            token,
        }
    }
}

#[derive(Default)]
pub struct AuthSessionBuilder {
    user_id: Option<UserId>,
    email: Option<String>,
    display_name: Option<String>,
    roles: Option<RoleSet>,
    tenant_id: Option<TenantId>,
    hotel_id: Option<HotelId>,
    hotel_name: Option<String>,
    token: Option<SessionToken>,
}

impl AuthSessionBuilder {
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn roles(mut self, roles: RoleSet) -> Self {
        self.roles = Some(roles);
        self
    }

    pub fn tenant_id(mut self, tenant_id: Option<TenantId>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn hotel_id(mut self, hotel_id: Option<HotelId>) -> Self {
        self.hotel_id = hotel_id;
        self
    }

    pub fn hotel_name(mut self, hotel_name: Option<String>) -> Self {
        self.hotel_name = hotel_name;
        self
    }

    pub fn token(mut self, token: SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn build(self) -> Result<AuthSession, Error> {
        Ok(AuthSession {
            user_id: self.user_id.ok_or(ValidationError::MissingField(
                "User ID is required".to_string(),
            ))?,
            email: self.email.ok_or(ValidationError::MissingField(
                "Email is required".to_string(),
            ))?,
            display_name: self.display_name.unwrap_or_default(),
            roles: self.roles.unwrap_or_default(),
            tenant_id: self.tenant_id,
            hotel_id: self.hotel_id,
            hotel_name: self.hotel_name,
            token: self.token.ok_or(ValidationError::MissingField(
                "Token is required".to_string(),
            ))?,
        })
    }
}

/// Login state machine states.
///
/// `SessionExpired` is a logged-out state reachable only via an external
/// session-expired signal (e.g. a 401 on an authenticated call); it is kept
/// distinct so callers can show "your session timed out" instead of the
/// generic logged-out message.
#[derive(Debug, Clone, Default)]
pub enum AuthState {
    #[default]
    LoggedOut,
    LoggingIn,
    LoggedIn(AuthSession),
    SessionExpired,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::LoggedIn(_))
    }

    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            AuthState::LoggedIn(session) => Some(session),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff_session() -> AuthSession {
        AuthSession::builder()
            .user_id(UserId::new("usr_7"))
            .email("desk@grandhotel.test")
            .display_name("Dana Desk")
            .roles(RoleSet::from(["FRONTDESK"]))
            .tenant_id(Some(TenantId::new("grand-hotels").unwrap()))
            .hotel_id(Some(HotelId::new("5")))
            .hotel_name(Some("Grand Hotel".to_string()))
            .token(SessionToken::new("tok"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_session_builder_requires_identity() {
        let result = AuthSession::builder().email("a@b.test").build();
        assert!(result.is_err());

        let result = AuthSession::builder()
            .user_id(UserId::new("usr_1"))
            .token(SessionToken::new("tok"))
            .build();
        assert!(result.is_err()); // missing email
    }

    #[test]
    fn test_tenant_bound_session_is_not_system_wide() {
        let session = staff_session();
        assert!(session.is_tenant_bound());
        assert!(!session.is_system_wide());
    }

    #[test]
    fn test_system_wide_requires_role_and_no_tenant() {
        let admin = AuthSession::builder()
            .user_id(UserId::new("usr_1"))
            .email("admin@system.test")
            .roles(RoleSet::from(["SYSTEM_ADMIN"]))
            .token(SessionToken::new("tok"))
            .build()
            .unwrap();
        assert!(admin.is_system_wide());
        assert!(!admin.is_tenant_bound());

        // No tenant but only a staff role: not system-wide either.
        let odd = AuthSession::builder()
            .user_id(UserId::new("usr_2"))
            .email("desk@nowhere.test")
            .roles(RoleSet::from(["FRONTDESK"]))
            .token(SessionToken::new("tok"))
            .build()
            .unwrap();
        assert!(!odd.is_system_wide());
    }

    #[test]
    fn test_profile_round_trip() {
        let session = staff_session();
        let rebuilt =
            AuthSession::from_profile(session.profile(), session.token.clone());
        assert_eq!(rebuilt, session);
    }

    #[test]
    fn test_auth_state_accessors() {
        assert!(!AuthState::LoggedOut.is_authenticated());
        assert!(!AuthState::SessionExpired.is_authenticated());
        assert!(AuthState::LoggedIn(staff_session()).is_authenticated());
        assert!(AuthState::LoggingIn.session().is_none());
    }
}
