//! # Concierge
//!
//! Concierge is the authentication and caching layer for multi-tenant hotel
//! management clients. Hotel staff must be able to keep working through a
//! backend outage, so Concierge pairs every online login with a locally
//! persisted, password-verified staff session that can authenticate the same
//! account offline, and keeps a per-hotel room snapshot fresh in the
//! background.
//!
//! The coordinator owns the login state machine:
//!
//! ```text
//! LoggedOut -> LoggingIn -> LoggedIn
//!      ^                       |
//!      +--- logout / expiry ---+
//! ```
//!
//! `SessionExpired` is a distinguishable logged-out state so callers can
//! show "your session timed out" instead of the generic message.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use concierge::{Concierge, ConciergeConfig};
//! use concierge_rest::{RestConfig, RestConnector};
//! use concierge_storage_sqlite::SqliteRepositoryProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repositories =
//!         Arc::new(SqliteRepositoryProvider::connect("sqlite://concierge.db?mode=rwc").await?);
//!     let backend = Arc::new(RestConnector::new(RestConfig::new("http://localhost:8080"))?);
//!
//!     let concierge = Concierge::new(repositories, backend);
//!     concierge.initialize().await?;
//!
//!     let session = concierge.login("desk@grandhotel.test", "p@ss").await?;
//!     println!("logged in as {}", session.display_name);
//!     Ok(())
//! }
//! ```

mod rooms;
mod tenant;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use concierge_core::{
    AuthSession, AuthState, BackendConnector, Error, HotelId, LoginResponse, ProfileUpdate,
    Room, SessionEvent, SessionEventBus, SessionEventHandler, StaffSessionRecord,
    TenantContext, TenantDirectory, UserProfile,
    crypto,
    error::AuthError,
    repositories::{
        CredentialRepository, CredentialRepositoryProvider, RepositoryProvider,
        StaffSessionRepository, StaffSessionRepositoryProvider,
    },
    validation::{validate_email, validate_password},
};

pub use rooms::{RoomCache, RoomFetchContext};
pub use tenant::TenantResolver;

/// Re-export core types commonly used with the Concierge API.
pub use concierge_core::{
    RoleSet, TenantId, TenantInfo, UserId,
};

/// Re-export the SQLite storage backend.
#[cfg(feature = "sqlite")]
pub use concierge_storage_sqlite::SqliteRepositoryProvider;

/// Re-export the REST backend connector.
#[cfg(feature = "rest")]
pub use concierge_rest::{RestConfig, RestConnector};

/// The single message shown for a failed login. Detail about which stage
/// failed (online, offline, and why) goes to logs only.
const LOGIN_FAILED_MESSAGE: &str =
    "Login failed. Check your email and password, or try again once you're back online.";

const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Configuration for the coordinator.
pub struct ConciergeConfig {
    /// How long a cached staff session may authenticate offline, measured
    /// from the online login that created it.
    pub offline_session_ttl: chrono::Duration,

    /// Interval of the background room snapshot refresh.
    pub room_refresh_interval: Duration,

    /// Allow offline login against a record that carries no password
    /// verifier. Off by default: without a verifier the only check left is
    /// the email, which is not authentication. When enabled, every such
    /// login is logged at WARN.
    pub allow_unverified_offline_login: bool,

    /// Locally known tenants for directory lookups.
    pub tenants: TenantDirectory,
}

impl Default for ConciergeConfig {
    fn default() -> Self {
        Self {
            offline_session_ttl: chrono::Duration::hours(24),
            room_refresh_interval: Duration::from_secs(15 * 60),
            allow_unverified_offline_login: false,
            tenants: TenantDirectory::default(),
        }
    }
}

impl ConciergeConfig {
    pub fn with_offline_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.offline_session_ttl = ttl;
        self
    }

    pub fn with_room_refresh_interval(mut self, interval: Duration) -> Self {
        self.room_refresh_interval = interval;
        self
    }

    pub fn with_unverified_offline_login(mut self, allow: bool) -> Self {
        self.allow_unverified_offline_login = allow;
        self
    }

    pub fn with_tenant_directory(mut self, tenants: TenantDirectory) -> Self {
        self.tenants = tenants;
        self
    }
}

/// The coordinating service: auth state machine, offline fallback, room
/// cache lifecycle, and tenant resolution.
///
/// The in-memory session is exclusively owned here; everything else receives
/// cloned, read-only views. Dependents subscribe to [`SessionEvent`]s rather
/// than being wired into the login and logout paths.
pub struct Concierge<R: RepositoryProvider, B: BackendConnector> {
    repositories: Arc<R>,
    backend: Arc<B>,
    state: RwLock<AuthState>,
    last_error: RwLock<Option<String>>,
    rooms: RoomCache<R, B>,
    tenants: RwLock<TenantResolver>,
    events: SessionEventBus,
    config: ConciergeConfig,
}

impl<R: RepositoryProvider, B: BackendConnector> Concierge<R, B> {
    /// Create a new Concierge with default configuration.
    pub fn new(repositories: Arc<R>, backend: Arc<B>) -> Self {
        Self::with_config(repositories, backend, ConciergeConfig::default())
    }

    pub fn with_config(repositories: Arc<R>, backend: Arc<B>, config: ConciergeConfig) -> Self {
        let rooms = RoomCache::new(repositories.clone(), backend.clone());
        let tenants = RwLock::new(TenantResolver::new(config.tenants.clone()));

        Self {
            repositories,
            backend,
            state: RwLock::new(AuthState::LoggedOut),
            last_error: RwLock::new(None),
            rooms,
            tenants,
            events: SessionEventBus::new(),
            config,
        }
    }

    /// One-time setup at well-defined lifecycle points: storage migrations
    /// (deduplicated across concurrent callers), legacy credential
    /// migration, and expired staff session cleanup.
    pub async fn initialize(&self) -> Result<(), Error> {
        self.repositories.initialize().await?;

        self.repositories
            .credentials()
            .migrate_legacy_tokens()
            .await?;

        if let Err(e) = self.repositories.staff_sessions().delete_expired().await {
            tracing::warn!(error = %e, "Expired staff session cleanup failed");
        }

        Ok(())
    }

    /// Rebuild the session from persisted credentials after a process
    /// restart. Returns `None` when no complete credentials survive.
    pub async fn restore_session(&self) -> Result<Option<AuthSession>, Error> {
        let credentials = self.repositories.credentials();
        let (Some(token), Some(profile)) =
            (credentials.token().await?, credentials.user().await?)
        else {
            return Ok(None);
        };

        let session = AuthSession::from_profile(profile, token);
        self.enter_session(session.clone(), true).await;

        tracing::info!(user_id = %session.user_id, "Session restored from persisted credentials");
        Ok(Some(session))
    }

    /// Current login state (cloned view).
    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    /// The active session, if logged in.
    pub async fn session(&self) -> Option<AuthSession> {
        self.state.read().await.session().cloned()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// The user-facing message for the most recent failure, if any. A
    /// session-expiry message is distinct from a login failure message.
    pub async fn error_message(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// The tenant context derived from the active session's token.
    pub async fn tenant_context(&self) -> TenantContext {
        self.tenants.read().await.context().clone()
    }

    /// Subscribe to session lifecycle events.
    pub async fn subscribe(&self, handler: Arc<dyn SessionEventHandler>) {
        self.events.register(handler).await;
    }

    /// Log in. Attempts online authentication first; on any transport or
    /// server failure falls back to the offline session cache, strictly in
    /// that order. On success the session is persisted, the tenant context
    /// updated, and (for hotel-bound staff) the room cache activated in the
    /// background. On failure no partial state is left behind.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, Error> {
        validate_email(email)?;
        validate_password(password)?;

        *self.state.write().await = AuthState::LoggingIn;

        match self.backend.login(email, password).await {
            Ok(response) => self.complete_online_login(response, password).await,
            Err(e) => {
                // Deliberate policy: any transport/server error is treated
                // as "maybe offline" so staff can operate during outages.
                tracing::warn!(error = %e, "Online login failed, attempting offline fallback");
                self.offline_login(email, password).await
            }
        }
    }

    /// Log out. Always succeeds: the room refresh stops, staff session
    /// records are deactivated (not deleted), credentials and tenant
    /// context are cleared, and dependents are notified. Storage failures
    /// are logged and swallowed.
    pub async fn logout(&self) {
        let prior = self.state.read().await.session().cloned();

        self.teardown_session().await;

        *self.state.write().await = AuthState::LoggedOut;
        *self.last_error.write().await = None;

        if let Some(session) = prior {
            tracing::info!(user_id = %session.user_id, "Logged out");
            self.events
                .emit(&SessionEvent::LoggedOut(session.user_id))
                .await;
        }
    }

    /// Handle an externally detected session expiry (e.g. a 401 on any
    /// authenticated call). Same side effects as [`logout`](Self::logout),
    /// plus the distinct expired state and message. Idempotent: repeat
    /// triggers produce the same end state with no duplicate side effects.
    pub async fn handle_session_expired(&self) {
        {
            let state = self.state.read().await;
            if matches!(*state, AuthState::SessionExpired) {
                return;
            }
        }

        let prior = self.state.read().await.session().cloned();

        self.teardown_session().await;

        *self.state.write().await = AuthState::SessionExpired;
        *self.last_error.write().await = Some(SESSION_EXPIRED_MESSAGE.to_string());

        if let Some(session) = prior {
            tracing::info!(user_id = %session.user_id, "Session expired");
            self.events
                .emit(&SessionEvent::Expired(session.user_id))
                .await;
        }
    }

    /// Update the authenticated user's profile. Requires an active session
    /// and a server round-trip; there is no offline fallback and no local
    /// mutation on failure.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, Error> {
        let session = self
            .session()
            .await
            .ok_or(Error::Auth(AuthError::NotLoggedIn))?;

        let profile = self.backend.update_profile(&session.token, update).await?;

        if let Err(e) = self.repositories.credentials().update_user(&profile).await {
            tracing::warn!(error = %e, "Failed to persist updated profile");
        }

        let mut state = self.state.write().await;
        if let AuthState::LoggedIn(session) = &mut *state {
            session.display_name = profile.display_name.clone();
            session.email = profile.email.clone();
        }

        Ok(profile)
    }

    /// Change the authenticated user's password. Online only; no local
    /// state changes on failure.
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<(), Error> {
        validate_password(new_password)?;

        let session = self
            .session()
            .await
            .ok_or(Error::Auth(AuthError::NotLoggedIn))?;

        self.backend
            .change_password(&session.token, old_password, new_password)
            .await
    }

    /// Rooms for a hotel: cached unless `force_refresh` is set or no
    /// snapshot exists. Requires an active session.
    pub async fn rooms(&self, hotel_id: &HotelId, force_refresh: bool) -> Result<Vec<Room>, Error> {
        let session = self
            .session()
            .await
            .ok_or(Error::Auth(AuthError::NotLoggedIn))?;

        let context = RoomFetchContext {
            token: session.token.clone(),
            tenant_id: session.tenant_id.clone(),
            hotel_id: hotel_id.clone(),
        };
        self.rooms.rooms(&context, force_refresh).await
    }

    // ------------------------------------------------------------------
    // Login internals
    // ------------------------------------------------------------------

    async fn complete_online_login(
        &self,
        response: LoginResponse,
        password: &str,
    ) -> Result<AuthSession, Error> {
        let session = match AuthSession::builder()
            .user_id(response.user_id.clone())
            .email(response.email.clone())
            .display_name(response.display_name())
            .roles(response.roles.clone())
            .tenant_id(response.tenant_id.clone())
            .hotel_id(response.hotel_id.clone())
            .hotel_name(response.hotel_name.clone())
            .token(response.token.clone())
            .build()
        {
            Ok(session) => session,
            Err(e) => {
                self.fail_login(LOGIN_FAILED_MESSAGE).await;
                return Err(e);
            }
        };

        // The token must be persisted or the user is not logged in.
        if let Err(e) = self
            .repositories
            .credentials()
            .set_auth(&session.token, &session.profile())
            .await
        {
            tracing::error!(error = %e, "Credential persistence failed; aborting login");
            self.fail_login("Login failed: credentials could not be saved")
                .await;
            return Err(e);
        }

        if session.roles.is_hotel_staff() {
            self.cache_staff_session(&session, password).await;
        }

        self.enter_session(session.clone(), true).await;

        tracing::info!(user_id = %session.user_id, "Online login succeeded");
        Ok(session)
    }

    /// Upsert the offline staff session record for a freshly authenticated
    /// staff account. Failure degrades offline capability but must not fail
    /// the login.
    async fn cache_staff_session(&self, session: &AuthSession, password: &str) {
        let verifier = crypto::hash_password(password);
        let record = StaffSessionRecord::builder()
            .user_id(session.user_id.clone())
            .username(session.display_name.clone())
            .email(session.email.clone())
            .roles(session.roles.clone())
            .hotel_id(session.hotel_id.clone())
            .hotel_name(session.hotel_name.clone())
            .tenant_id(session.tenant_id.clone())
            .token(session.token.clone())
            .password_verifier(Some(verifier))
            .expires_at(Utc::now() + self.config.offline_session_ttl)
            .is_active(true)
            .build();

        match record {
            Ok(record) => {
                if let Err(e) = self.repositories.staff_sessions().upsert(&record).await {
                    tracing::warn!(error = %e, "Staff session caching failed; offline login will be unavailable");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not build staff session record");
            }
        }
    }

    async fn offline_login(&self, email: &str, password: &str) -> Result<AuthSession, Error> {
        let record = match self
            .repositories
            .staff_sessions()
            .find_for_offline_auth(email)
            .await
        {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::info!("No cached staff session for offline login");
                return self.reject_login().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Offline session lookup failed");
                return self.reject_login().await;
            }
        };

        if record.email != email {
            tracing::warn!("Cached staff session email mismatch");
            return self.reject_login().await;
        }

        if record.is_expired() {
            tracing::info!("Cached staff session is expired");
            return self.reject_login().await;
        }

        if !record.roles.is_hotel_staff() {
            tracing::info!("Cached session roles are not hotel staff; offline login refused");
            return self.reject_login().await;
        }

        match &record.password_verifier {
            Some(verifier) => match crypto::verify_password(password, verifier) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::info!("Offline password validation failed");
                    return self.reject_login().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Stored password verifier is unusable");
                    return self.reject_login().await;
                }
            },
            None => {
                if !self.config.allow_unverified_offline_login {
                    tracing::warn!(
                        "Cached session has no password verifier and unverified offline login is disabled"
                    );
                    return self.reject_login().await;
                }
                // Degraded trust, by explicit configuration only.
                tracing::warn!(email, "Offline login WITHOUT password verification");
            }
        }

        let session = match AuthSession::builder()
            .user_id(record.user_id.clone())
            .email(record.email.clone())
            .display_name(record.username.clone())
            .roles(record.roles.clone())
            .tenant_id(record.tenant_id.clone())
            .hotel_id(record.hotel_id.clone())
            .hotel_name(record.hotel_name.clone())
            .token(record.token.clone())
            .build()
        {
            Ok(session) => session,
            Err(e) => {
                self.fail_login(LOGIN_FAILED_MESSAGE).await;
                return Err(e);
            }
        };

        // Same rule as online: no persisted token, no login.
        if let Err(e) = self
            .repositories
            .credentials()
            .set_auth(&session.token, &session.profile())
            .await
        {
            tracing::error!(error = %e, "Credential persistence failed; aborting offline login");
            self.fail_login("Login failed: credentials could not be saved")
                .await;
            return Err(e);
        }

        let mut reactivated = record;
        reactivated.is_active = true;
        reactivated.last_activity = Utc::now();
        if let Err(e) = self.repositories.staff_sessions().upsert(&reactivated).await {
            tracing::warn!(error = %e, "Failed to reactivate staff session record");
        }

        self.enter_session(session.clone(), false).await;

        tracing::info!(user_id = %session.user_id, "Offline login succeeded");
        Ok(session)
    }

    /// Shared tail of both login paths: tenant derivation, state
    /// transition, event emission, and (online only) background room cache
    /// activation.
    async fn enter_session(&self, session: AuthSession, activate_rooms: bool) {
        self.tenants.write().await.update_from_token(&session.token);

        if activate_rooms && session.roles.is_hotel_staff() {
            if let Some(hotel_id) = &session.hotel_id {
                // Fire and forget: login resolves without waiting for the
                // room cache to fill.
                let context = RoomFetchContext {
                    token: session.token.clone(),
                    tenant_id: session.tenant_id.clone(),
                    hotel_id: hotel_id.clone(),
                };
                self.rooms
                    .start_periodic_refresh(context, self.config.room_refresh_interval)
                    .await;
            }
        }

        *self.state.write().await = AuthState::LoggedIn(session.clone());
        *self.last_error.write().await = None;

        self.events.emit(&SessionEvent::Established(session)).await;
    }

    /// Consolidated rejection for both failed paths: one message, clean
    /// logged-out state, typed error.
    async fn reject_login(&self) -> Result<AuthSession, Error> {
        self.fail_login(LOGIN_FAILED_MESSAGE).await;
        Err(Error::Auth(AuthError::LoginFailed(
            LOGIN_FAILED_MESSAGE.to_string(),
        )))
    }

    async fn fail_login(&self, message: &str) {
        *self.state.write().await = AuthState::LoggedOut;
        *self.last_error.write().await = Some(message.to_string());
    }

    /// Logout side effects shared with expiry handling. Nothing here may
    /// fail the caller.
    async fn teardown_session(&self) {
        self.rooms.stop_periodic_refresh().await;

        if let Err(e) = self.repositories.staff_sessions().deactivate_all().await {
            tracing::error!(error = %e, "Failed to deactivate staff sessions");
        }

        if let Err(e) = self.repositories.credentials().clear_auth().await {
            tracing::error!(error = %e, "Failed to clear credentials");
        }

        self.tenants.write().await.clear();
    }
}
