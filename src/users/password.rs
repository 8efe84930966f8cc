//! Argon2id credential hashing. The hash work runs on the blocking pool so a
//! register or login never stalls an async worker.

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tokio::task;

use crate::error::ApiError;

fn hash_blocking(plain: &[u8]) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain, &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow::anyhow!("argon2 hashing failed: {e}"))
}

fn verify_blocking(plain: &[u8], stored: &str) -> anyhow::Result<bool> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| anyhow::anyhow!("stored hash unreadable: {e}"))?;
    Ok(Argon2::default().verify_password(plain, &parsed).is_ok())
}

/// Hashes a new password with a fresh salt.
pub async fn hash(plain: String) -> Result<String, ApiError> {
    let hashed = task::spawn_blocking(move || hash_blocking(plain.as_bytes()))
        .await
        .context("password hashing task")??;
    Ok(hashed)
}

/// `Ok(false)` on mismatch; `Err` when the stored hash cannot be parsed or the task dies.
pub async fn verify(plain: String, stored: String) -> Result<bool, ApiError> {
    let ok = task::spawn_blocking(move || verify_blocking(plain.as_bytes(), &stored))
        .await
        .context("password verification task")??;
    Ok(ok)
}
