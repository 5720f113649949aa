//! Password hashing with Argon2id.
//!
//! Default cost parameters (19 MiB memory, 2 iterations) keep hashing
//! latency in the tens of milliseconds while staying memory-hard. Each
//! hash carries its own random salt in the PHC string.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

use crate::error::AuthServiceError;

/// Hash a password for storage. The returned PHC string embeds the
/// algorithm parameters and salt.
pub fn hash_password(password: &str) -> Result<String, AuthServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthServiceError::Internal(anyhow::anyhow!("argon2 hash: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored digest.
///
/// Never errors: a malformed digest is logged and treated as a
/// mismatch, because the caller is the login path and must not turn a
/// corrupt row into a 500.
pub fn verify_password(password: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    }
}
