use async_trait::async_trait;

use crate::{Error, session::SessionToken, user::UserProfile};

/// Persistence for the last-known bearer token and user profile.
///
/// No network access; a pure local persistence wrapper. The token is the
/// ground truth for "logged in across restarts": a login is not considered
/// complete until `set_auth` has succeeded.
#[async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    /// Persist token and profile atomically: both are stored or neither is.
    async fn set_auth(&self, token: &SessionToken, user: &UserProfile) -> Result<(), Error>;

    /// The persisted token, if any.
    async fn token(&self) -> Result<Option<SessionToken>, Error>;

    /// The persisted profile, if any. Malformed persisted data is cleared
    /// and reported as absent, never as an error.
    async fn user(&self) -> Result<Option<UserProfile>, Error>;

    /// Replace the profile only; the token is untouched.
    async fn update_user(&self, user: &UserProfile) -> Result<(), Error>;

    /// Remove token and profile. Idempotent.
    async fn clear_auth(&self) -> Result<(), Error>;

    /// One-time best-effort conversion of credentials stored under legacy
    /// keys by earlier releases. Malformed legacy data is logged and
    /// skipped; this never fails the caller.
    async fn migrate_legacy_tokens(&self) -> Result<(), Error>;
}
