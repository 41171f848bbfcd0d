//! Password hashing and verification (bcrypt).

use anyhow::{Context, Result};
use log::warn;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).context("Failed to hash password")
}

/// Verify a password against a stored bcrypt hash.
///
/// A stored hash that cannot be parsed counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matched) => matched,
        Err(e) => {
            warn!("Stored password hash is unusable: {e}");
            false
        }
    }
}

/// Hash on the blocking pool so the work factor never stalls async workers.
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .context("password hashing task failed")?
}

/// Verify on the blocking pool.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .context("password verification task failed")
}
