//! Shared test fixtures: an in-memory SQLite provider and a scripted
//! backend with call counters and an online/offline toggle.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};

use concierge::{Concierge, ConciergeConfig, SqliteRepositoryProvider};
use concierge_core::{
    BackendConnector, Error, HotelId, LoginResponse, ProfileUpdate, RoleSet, Room, SessionToken,
    TenantId, UserId, UserProfile,
    error::TransportError,
};

pub const FRONTDESK_EMAIL: &str = "desk@grandhotel.test";
pub const FRONTDESK_PASSWORD: &str = "p@ss";

struct MockUser {
    email: String,
    password: String,
    response: LoginResponse,
}

/// Scripted stand-in for the REST backend.
#[derive(Default)]
pub struct MockBackend {
    online: AtomicBool,
    users: Mutex<Vec<MockUser>>,
    rooms: Mutex<Vec<Room>>,
    pub login_calls: AtomicUsize,
    pub room_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        let backend = Self::default();
        backend.online.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn add_user(&self, email: &str, password: &str, response: LoginResponse) {
        self.users.lock().unwrap().push(MockUser {
            email: email.to_string(),
            password: password.to_string(),
            response,
        });
    }

    pub fn set_rooms(&self, rooms: Vec<Room>) {
        *self.rooms.lock().unwrap() = rooms;
    }

    pub fn room_call_count(&self) -> usize {
        self.room_calls.load(Ordering::SeqCst)
    }

    fn offline_error() -> Error {
        Error::Transport(TransportError::Network("connection refused".to_string()))
    }
}

#[async_trait]
impl BackendConnector for MockBackend {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, Error> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);

        if !self.is_online() {
            return Err(Self::offline_error());
        }

        let users = self.users.lock().unwrap();
        match users
            .iter()
            .find(|u| u.email == email && u.password == password)
        {
            Some(user) => Ok(user.response.clone()),
            None => Err(Error::Transport(TransportError::Status { status: 401 })),
        }
    }

    async fn fetch_rooms(
        &self,
        _token: &SessionToken,
        _tenant_id: Option<&TenantId>,
        _hotel_id: &HotelId,
    ) -> Result<Vec<Room>, Error> {
        self.room_calls.fetch_add(1, Ordering::SeqCst);

        if !self.is_online() {
            return Err(Self::offline_error());
        }

        Ok(self.rooms.lock().unwrap().clone())
    }

    async fn update_profile(
        &self,
        token: &SessionToken,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, Error> {
        if !self.is_online() {
            return Err(Self::offline_error());
        }

        let users = self.users.lock().unwrap();
        let user = users
            .iter()
            .find(|u| u.response.token == *token)
            .ok_or(Error::Transport(TransportError::Status { status: 401 }))?;

        let first = update
            .first_name
            .clone()
            .or_else(|| user.response.first_name.clone());
        let last = update
            .last_name
            .clone()
            .or_else(|| user.response.last_name.clone());
        let display_name = [first, last]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        Ok(UserProfile {
            id: user.response.user_id.clone(),
            email: user.response.email.clone(),
            display_name,
            roles: user.response.roles.clone(),
            tenant_id: user.response.tenant_id.clone(),
            hotel_id: user.response.hotel_id.clone(),
            hotel_name: user.response.hotel_name.clone(),
        })
    }

    async fn change_password(
        &self,
        _token: &SessionToken,
        _old_password: &str,
        _new_password: &str,
    ) -> Result<(), Error> {
        if !self.is_online() {
            return Err(Self::offline_error());
        }
        Ok(())
    }
}

/// An unsigned JWT carrying an optional tenant claim, shaped like the
/// backend's tokens.
pub fn jwt_token(tenant_id: Option<&str>) -> String {
    let header = BASE64_URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = match tenant_id {
        Some(id) => format!(r#"{{"sub":"usr_7","tenantId":"{id}"}}"#),
        None => r#"{"sub":"usr_1"}"#.to_string(),
    };
    let body = BASE64_URL_SAFE_NO_PAD.encode(payload.as_bytes());
    format!("{header}.{body}.sig")
}

/// A FRONTDESK account bound to hotel 5 of tenant `grand-hotels`.
pub fn frontdesk_response() -> LoginResponse {
    LoginResponse {
        user_id: UserId::new("7"),
        email: FRONTDESK_EMAIL.to_string(),
        first_name: Some("Dana".to_string()),
        last_name: Some("Desk".to_string()),
        roles: RoleSet::from(["FRONTDESK"]),
        tenant_id: Some(TenantId::new("grand-hotels").unwrap()),
        hotel_id: Some(HotelId::new("5")),
        hotel_name: Some("Grand Hotel".to_string()),
        token: SessionToken::new(&jwt_token(Some("grand-hotels"))),
    }
}

/// A desk account without a hotel binding (no background room refresh).
pub fn frontdesk_response_without_hotel() -> LoginResponse {
    let mut response = frontdesk_response();
    response.email = "nohotel@grandhotel.test".to_string();
    response.user_id = UserId::new("8");
    response.hotel_id = None;
    response.hotel_name = None;
    response
}

pub fn sample_rooms() -> Vec<Room> {
    vec![
        Room {
            id: "11".to_string(),
            room_number: "101".to_string(),
            room_type: "DOUBLE".to_string(),
            price_per_night: 120.0,
            capacity: 2,
            description: None,
            status: "AVAILABLE".to_string(),
        },
        Room {
            id: "12".to_string(),
            room_number: "102".to_string(),
            room_type: "SUITE".to_string(),
            price_per_night: 250.0,
            capacity: 4,
            description: Some("Corner suite".to_string()),
            status: "OCCUPIED".to_string(),
        },
    ]
}

pub async fn setup(
    config: ConciergeConfig,
) -> (
    Concierge<SqliteRepositoryProvider, MockBackend>,
    Arc<SqliteRepositoryProvider>,
    Arc<MockBackend>,
) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let repositories = Arc::new(
        SqliteRepositoryProvider::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database"),
    );
    let backend = MockBackend::new();
    backend.add_user(FRONTDESK_EMAIL, FRONTDESK_PASSWORD, frontdesk_response());
    backend.set_rooms(sample_rooms());

    let concierge = Concierge::with_config(repositories.clone(), backend.clone(), config);
    concierge
        .initialize()
        .await
        .expect("Failed to initialize concierge");

    (concierge, repositories, backend)
}

/// Poll until `predicate` holds or `timeout` elapses.
pub async fn wait_until(predicate: impl Fn() -> bool, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}
