use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Not logged in")]
    NotLoggedIn,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,
}

/// Errors raised by the REST backend connector.
///
/// Every variant is treated as "maybe offline" by the auth orchestrator:
/// hotel staff must be able to log in during an outage, so a failed online
/// attempt always proceeds to the offline fallback rather than surfacing
/// the transport detail.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Server returned status {status}")]
    Status { status: u16 },

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid tenant ID '{id}': {reason}")]
    InvalidTenantId { id: String, reason: String },

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event handler error: {0}")]
    HandlerError(String),
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
