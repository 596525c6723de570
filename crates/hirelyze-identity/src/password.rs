//! Argon2id password hashing.

use crate::IdentityError;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hashes `password` into a PHC string with a fresh random salt.
///
/// # Errors
///
/// Returns `IdentityError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            IdentityError::PasswordHash(e.to_string())
        })
}

/// Checks `password` against a stored PHC hash.
///
/// # Errors
///
/// - `WrongPassword` when the password does not match.
/// - `PasswordHash` when the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), IdentityError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        tracing::error!(error = %e, "stored password hash is malformed");
        IdentityError::PasswordHash(e.to_string())
    })?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| IdentityError::WrongPassword)
}
