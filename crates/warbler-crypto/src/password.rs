use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;
use tracing::warn;

/// Real Argon2 hash of a throwaway password, so a miss costs the same as a hit.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash("warbler-dummy-password").ok());

/// Hash a plaintext password with Argon2id and a fresh random salt.
/// Returns the PHC string (algorithm, params, salt and digest).
pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing failed: {}", e))?
        .to_string();

    Ok(hash)
}

/// Check a plaintext password against a stored PHC string.
///
/// A stored value that does not parse is treated as a mismatch.
pub fn verify(plaintext: &str, stored: &str) -> bool {
    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Unparseable password hash in storage: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Spend one verification's worth of work on a password that matches
/// nothing. Used when the account lookup misses.
pub fn verify_dummy(plaintext: &str) {
    match DUMMY_HASH.as_deref() {
        Some(stored) => {
            verify(plaintext, stored);
        }
        None => warn!("Dummy password hash unavailable"),
    }
}
