//! Password hashing and verification.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings, so the parameters and salt
//! travel with the hash and can be upgraded without a migration. Verification is constant-time
//! inside `argon2`. A mismatch is a normal `Ok(false)` outcome; only a stored hash that cannot
//! be parsed is an error, since that indicates a corrupted record rather than a bad login.

use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("The stored password hash is malformed. {0}")]
pub struct PasswordHashError(pub String);

/// Hash a plaintext password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordHashError(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a candidate password against a stored PHC hash. Returns `Ok(false)` on a mismatch and
/// only fails when the stored hash cannot be parsed.
pub fn verify_password(hashed: &str, candidate: &str) -> Result<bool, PasswordHashError> {
    let parsed = PasswordHash::new(hashed).map_err(|e| PasswordHashError(e.to_string()))?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordHashError(e.to_string())),
    }
}

// Hashing with the default parameters cannot fail.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("#dummy-password#").expect("argon2 default parameters always hash"));

/// Burn one full Argon2 verification against a throwaway hash. Login calls this when the
/// identifier does not match any user, so that the unknown-identifier and wrong-password paths
/// take comparable time and identifiers cannot be enumerated via a timing side channel.
pub fn verify_against_dummy(candidate: &str) {
    let _unused = verify_password(&DUMMY_HASH, candidate);
}
