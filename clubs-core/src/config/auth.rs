//! Session token configuration.

use clubs_sdk::token::{SessionToken, TokenError};

/// Key and lifetime of issued bearer tokens.
#[derive(Clone)]
pub struct AuthConfig {
    token_secret: Box<[u8]>,
    /// Lifetime of a new token, in seconds.
    pub token_ttl_secs: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(token_secret: impl Into<Box<[u8]>>, token_ttl_secs: i64) -> Self {
        Self {
            token_secret: token_secret.into(),
            token_ttl_secs,
        }
    }

    /// Issue a signed token for `user_id`.
    pub fn issue(&self, user_id: i64) -> String {
        SessionToken::new(user_id, self.token_ttl_secs).sign(&self.token_secret)
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<SessionToken, TokenError> {
        SessionToken::verify(token, &self.token_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let auth = AuthConfig::new(b"0123456789abcdef".to_vec(), 3600);
        let token = auth.issue(5);
        assert_eq!(auth.verify(&token).unwrap().user_id, 5);

        let other = AuthConfig::new(b"another-sixteen-b".to_vec(), 3600);
        assert_eq!(other.verify(&token), Err(TokenError::SignatureMismatch));
        assert!(!format!("{auth:?}").contains("0123"));
    }
}
