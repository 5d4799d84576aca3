//! Admin configuration.

use crate::credentials::verify_secret;

/// Admin configuration with hashed secret.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// The argon2 hash of the key required to create admin accounts.
    pub secret_hash: String,
}

impl AdminConfig {
    pub fn new(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    /// Verify a plaintext admin key against the stored hash.
    pub fn verify_secret(&self, plaintext: &str) -> bool {
        verify_secret(plaintext, &self.secret_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::hash_secret;

    #[test]
    fn test_verify_secret() {
        let admin_config = AdminConfig::new(hash_secret("club-admin-key").unwrap());
        assert!(admin_config.verify_secret("club-admin-key"));
        assert!(!admin_config.verify_secret("wrong-key"));
    }
}
