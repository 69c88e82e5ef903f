//! Persisted staff session records
//!
//! A staff session record is written on every successful online login for a
//! hotel-staff account and is what makes a later offline login possible. The
//! record is keyed by email in storage; logout flips `is_active` to false
//! but keeps the record around so the same account can log back in during an
//! outage. The record carries an argon2 verifier of the password, never the
//! plaintext.
//!
//! | Field               | Type               | Description                                      |
//! | ------------------- | ------------------ | ------------------------------------------------ |
//! | `id`                | `String`           | Client-generated identifier (`ssn_` prefix).     |
//! | `user_id`           | `UserId`           | Backend user identifier.                         |
//! | `username`          | `String`           | Display name at the time of login.               |
//! | `email`             | `String`           | Lookup key for offline login.                    |
//! | `roles`             | `RoleSet`          | Ordered roles; must intersect the staff set.     |
//! | `password_verifier` | `Option<String>`   | Argon2 PHC string; absent in degraded setups.    |
//! | `expires_at`        | `DateTime`         | Hard cutoff; expired records never authenticate. |
//! | `last_activity`     | `DateTime`         | Updated on every successful (re)activation.      |
//! | `is_active`         | `bool`             | At most one active record per device.            |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::ValidationError,
    id::generate_prefixed_id,
    role::RoleSet,
    room::HotelId,
    session::SessionToken,
    tenant::TenantId,
    user::UserId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffSessionRecord {
    pub id: String,

    pub user_id: UserId,

    pub username: String,

    pub email: String,

    pub roles: RoleSet,

    pub hotel_id: Option<HotelId>,

    pub hotel_name: Option<String>,

    pub tenant_id: Option<TenantId>,

    pub token: SessionToken,

    /// Argon2 PHC string computed from the login password. When absent,
    /// offline validation degrades to email-only and is rejected unless the
    /// caller explicitly opted in.
    pub password_verifier: Option<String>,

    pub expires_at: DateTime<Utc>,

    pub last_activity: DateTime<Utc>,

    pub is_active: bool,
}

impl StaffSessionRecord {
    pub fn builder() -> StaffSessionRecordBuilder {
        StaffSessionRecordBuilder::default()
    }

    /// An expired record must never authenticate a session, even when the
    /// password verifier matches.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Whether this record may participate in offline login fallback.
    pub fn is_offline_eligible(&self) -> bool {
        self.roles.is_hotel_staff() && !self.is_expired()
    }
}

#[derive(Default)]
pub struct StaffSessionRecordBuilder {
    id: Option<String>,
    user_id: Option<UserId>,
    username: Option<String>,
    email: Option<String>,
    roles: Option<RoleSet>,
    hotel_id: Option<HotelId>,
    hotel_name: Option<String>,
    tenant_id: Option<TenantId>,
    token: Option<SessionToken>,
    password_verifier: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    last_activity: Option<DateTime<Utc>>,
    is_active: Option<bool>,
}

impl StaffSessionRecordBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn roles(mut self, roles: RoleSet) -> Self {
        self.roles = Some(roles);
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

    pub fn tenant_id(mut self, tenant_id: Option<TenantId>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn token(mut self, token: SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn password_verifier(mut self, verifier: Option<String>) -> Self {
        self.password_verifier = verifier;
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn last_activity(mut self, last_activity: DateTime<Utc>) -> Self {
        self.last_activity = Some(last_activity);
        self
    }

    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn build(self) -> Result<StaffSessionRecord, Error> {
        let now = Utc::now();
        Ok(StaffSessionRecord {
            id: self.id.unwrap_or_else(|| generate_prefixed_id("ssn")),
            user_id: self.user_id.ok_or(ValidationError::MissingField(
                "User ID is required".to_string(),
            ))?,
            username: self.username.unwrap_or_default(),
            email: self.email.ok_or(ValidationError::MissingField(
                "Email is required".to_string(),
            ))?,
            roles: self.roles.unwrap_or_default(),
            hotel_id: self.hotel_id,
            hotel_name: self.hotel_name,
            tenant_id: self.tenant_id,
            token: self.token.ok_or(ValidationError::MissingField(
                "Token is required".to_string(),
            ))?,
            password_verifier: self.password_verifier,
            expires_at: self
                .expires_at
                .unwrap_or(now + chrono::Duration::hours(24)),
            last_activity: self.last_activity.unwrap_or(now),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}
