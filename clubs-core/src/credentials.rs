//! Argon2 password hashing.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

#[derive(Debug, thiserror::Error)]
#[error("password hashing error: {0}")]
pub struct HashError(String);

/// Hash a plaintext secret into an argon2 PHC string.
pub fn hash_secret(plaintext: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashError(e.to_string()))
}

/// Verify a plaintext secret against a stored PHC string.
///
/// A malformed hash never verifies.
pub fn verify_secret(plaintext: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Whether `value` already looks like an argon2 PHC string.
pub fn is_argon2_hash(value: &str) -> bool {
    value.starts_with("$argon2")
}

/// [`hash_secret`] on the blocking thread pool.
pub async fn hash_secret_blocking(plaintext: String) -> Result<String, HashError> {
    tokio::task::spawn_blocking(move || hash_secret(&plaintext))
        .await
        .map_err(|e| HashError(e.to_string()))?
}

/// [`verify_secret`] on the blocking thread pool. A failed task never verifies.
pub async fn verify_secret_blocking(plaintext: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify_secret(&plaintext, &hash))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("hunter22").unwrap();
        assert!(is_argon2_hash(&hash));
        assert!(verify_secret("hunter22", &hash));
        assert!(!verify_secret("hunter23", &hash));
        assert!(!verify_secret("hunter22", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_blocking_hash_and_verify() {
        let hash = hash_secret_blocking("club-pass".to_string()).await.unwrap();
        assert!(verify_secret_blocking("club-pass".to_string(), hash.clone()).await);
        assert!(!verify_secret_blocking("club-pas".to_string(), hash).await);
    }
}
