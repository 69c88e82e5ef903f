//! Password verifier handling for offline credential validation
//!
//! The offline session cache stores an argon2id verifier of the login
//! password, never the plaintext. The PHC string embeds its own random salt
//! and parameters, and verification inside the hashing crate is
//! constant-time, so a stolen cache does not yield passwords and timing does
//! not leak match positions.

use crate::error::CryptoError;

/// Compute a password verifier (argon2id PHC string) for storage.
pub fn hash_password(password: &str) -> String {
    password_auth::generate_hash(password)
}

/// Verify a plaintext password against a stored verifier.
///
/// Returns `Ok(false)` on mismatch and `Err` only when the stored verifier
/// itself is malformed.
pub fn verify_password(password: &str, verifier: &str) -> Result<bool, CryptoError> {
    use password_auth::VerifyError;

    match password_auth::verify_password(password, verifier) {
        Ok(()) => Ok(true),
        Err(VerifyError::PasswordInvalid) => Ok(false),
        Err(VerifyError::Parse(e)) => Err(CryptoError::PasswordHash(format!(
            "invalid stored verifier: {e}"
        ))),
    }
}
