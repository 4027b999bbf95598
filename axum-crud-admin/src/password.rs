//! Password hashing
//!
//! Passwords are only ever stored as Argon2id PHC strings. Hashing is
//! CPU-bound, so the async entry points move it onto the blocking pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("password hashing task failed: {0}")]
    Task(String),
}

/// Hash a password using Argon2id
pub fn hash_password_blocking(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|error| PasswordError::Hashing(error.to_string()))
}

/// Verify a password against its hash
///
/// A stored value that is not a valid PHC string never verifies.
pub fn verify_password_blocking(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub async fn hash_password(password: &str) -> Result<String, PasswordError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_password_blocking(&password))
        .await
        .map_err(|error| PasswordError::Task(error.to_string()))?
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || verify_password_blocking(&password, &hash))
        .await
        .map_err(|error| PasswordError::Task(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password_blocking("admin").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password_blocking("admin", &hash));
        assert!(!verify_password_blocking("wrong_password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password_blocking("admin").unwrap();
        let second = hash_password_blocking("admin").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_plaintext_never_verifies() {
        assert!(!verify_password_blocking("admin", "admin"));
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let hash = hash_password("secret").await.unwrap();
        assert!(verify_password("secret", &hash).await.unwrap());
    }
}
