//! REST implementation of the backend connector
//!
//! Talks to the hotel management backend over HTTP with `reqwest`. Each
//! endpoint has exactly one response schema; a body that does not match it
//! is a typed decode error, never a silently-tolerated alternate shape.
//! All errors map into [`TransportError`], which the auth orchestrator
//! treats as "maybe offline".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use concierge_core::{
    BackendConnector, Error, HotelId, LoginResponse, ProfileUpdate, RoleSet, Room, SessionToken,
    TenantId, UserId, UserProfile,
    error::TransportError,
};

/// Tenant scoping header expected by the backend.
const TENANT_HEADER: &str = "X-Tenant-ID";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the REST connector.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL of the backend, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `BackendConnector` over HTTP.
pub struct RestConnector {
    client: reqwest::Client,
    base_url: String,
}

impl RestConnector {
    pub fn new(config: RestConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Transport(TransportError::Network(e.to_string())))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Backend returned error status");
            return Err(Error::Transport(TransportError::Status {
                status: status.as_u16(),
            }));
        }
        Ok(response)
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// The login endpoint's response schema. One shape; a mismatch is a decode
/// error surfaced to the caller, not a fallback chain.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginWire {
    id: serde_json::Number,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    roles: Vec<String>,
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    hotel_id: Option<serde_json::Number>,
    #[serde(default)]
    hotel_name: Option<String>,
    token: String,
}

impl TryFrom<LoginWire> for LoginResponse {
    type Error = Error;

    fn try_from(wire: LoginWire) -> Result<Self, Error> {
        let tenant_id = wire
            .tenant_id
            .map(TenantId::new)
            .transpose()
            .map_err(|e| Error::Transport(TransportError::Decode(e.to_string())))?;

        Ok(LoginResponse {
            user_id: UserId::new(&wire.id.to_string()),
            email: wire.email,
            first_name: wire.first_name,
            last_name: wire.last_name,
            roles: RoleSet::new(wire.roles),
            tenant_id,
            hotel_id: wire.hotel_id.map(|id| HotelId::new(&id.to_string())),
            hotel_name: wire.hotel_name,
            token: SessionToken::new(&wire.token),
        })
    }
}

/// The room listing schema: a plain JSON array, not a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomWire {
    id: serde_json::Number,
    room_number: String,
    room_type: String,
    price_per_night: f64,
    capacity: u32,
    #[serde(default)]
    description: Option<String>,
    status: String,
}

impl From<RoomWire> for Room {
    fn from(wire: RoomWire) -> Self {
        Room {
            id: wire.id.to_string(),
            room_number: wire.room_number,
            room_type: wire.room_type,
            price_per_night: wire.price_per_night,
            capacity: wire.capacity,
            description: wire.description,
            status: wire.status,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileWire {
    id: serde_json::Number,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    roles: Vec<String>,
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    hotel_id: Option<serde_json::Number>,
    #[serde(default)]
    hotel_name: Option<String>,
}

impl TryFrom<ProfileWire> for UserProfile {
    type Error = Error;

    fn try_from(wire: ProfileWire) -> Result<Self, Error> {
        let tenant_id = wire
            .tenant_id
            .map(TenantId::new)
            .transpose()
            .map_err(|e| Error::Transport(TransportError::Decode(e.to_string())))?;

        let display_name = match (&wire.first_name, &wire.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        };

        Ok(UserProfile {
            id: UserId::new(&wire.id.to_string()),
            email: wire.email,
            display_name: display_name.trim().to_string(),
            roles: RoleSet::new(wire.roles),
            tenant_id,
            hotel_id: wire.hotel_id.map(|id| HotelId::new(&id.to_string())),
            hotel_name: wire.hotel_name,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileUpdateWire<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

fn network_error(e: reqwest::Error) -> Error {
    tracing::debug!(error = %e, "Backend request failed");
    Error::Transport(TransportError::Network(e.to_string()))
}

fn decode_error(e: reqwest::Error) -> Error {
    Error::Transport(TransportError::Decode(e.to_string()))
}

#[async_trait]
impl BackendConnector for RestConnector {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, Error> {
        let response = self
            .client
            .post(self.url("api/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(network_error)?;

        let response = Self::check_status(response).await?;
        let wire: LoginWire = response.json().await.map_err(decode_error)?;
        wire.try_into()
    }

    async fn fetch_rooms(
        &self,
        token: &SessionToken,
        tenant_id: Option<&TenantId>,
        hotel_id: &HotelId,
    ) -> Result<Vec<Room>, Error> {
        let mut request = self
            .client
            .get(self.url("api/rooms/all"))
            .query(&[("hotelId", hotel_id.as_str())])
            .bearer_auth(token.as_str());

        if let Some(tenant_id) = tenant_id {
            request = request.header(TENANT_HEADER, tenant_id.as_str());
        }

        let response = request.send().await.map_err(network_error)?;
        let response = Self::check_status(response).await?;
        let wire: Vec<RoomWire> = response.json().await.map_err(decode_error)?;

        Ok(wire.into_iter().map(Room::from).collect())
    }

    async fn update_profile(
        &self,
        token: &SessionToken,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, Error> {
        let response = self
            .client
            .put(self.url("api/users/me"))
            .bearer_auth(token.as_str())
            .json(&ProfileUpdateWire {
                first_name: update.first_name.as_deref(),
                last_name: update.last_name.as_deref(),
                phone: update.phone.as_deref(),
            })
            .send()
            .await
            .map_err(network_error)?;

        let response = Self::check_status(response).await?;
        let wire: ProfileWire = response.json().await.map_err(decode_error)?;
        wire.try_into()
    }

    async fn change_password(
        &self,
        token: &SessionToken,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        let response = self
            .client
            .post(self.url("api/users/me/password"))
            .bearer_auth(token.as_str())
            .json(&ChangePasswordRequest {
                old_password,
                new_password,
            })
            .send()
            .await
            .map_err(network_error)?;

        Self::check_status(response).await?;
        Ok(())
    }
}
