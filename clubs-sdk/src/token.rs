//! Session tokens for the club activities API.
//!
//! Every authenticated endpoint expects a bearer token issued by the
//! `/api/auth/*` endpoints. The wire format is:
//!
//! ```text
//! Authorization: Bearer {user_id}.{expires_at}.{base64_signature}
//! ```
//!
//! where the signature is `HMAC-SHA256("{user_id}.{expires_at}", token_secret)`
//! and `expires_at` is a unix timestamp in seconds.

/// Header carrying the bearer token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Scheme prefix of the authorization header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Token type reported to clients alongside the access token.
pub const TOKEN_TYPE: &str = "bearer";

/// Default token lifetime (in seconds).
pub const DEFAULT_TOKEN_TTL: i64 = 24 * 60 * 60;

/// Errors produced by token operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("token expired")]
    Expired,
}

impl From<ring::error::Unspecified> for TokenError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

/// The claims carried by a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken {
    pub user_id: i64,
    pub expires_at: i64,
}

impl SessionToken {
    /// Create claims for `user_id` that expire `ttl_secs` from now.
    pub fn new(user_id: i64, ttl_secs: i64) -> Self {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        Self {
            user_id,
            expires_at: now.saturating_add(ttl_secs),
        }
    }

    fn payload(&self) -> String {
        format!("{}.{}", self.user_id, self.expires_at)
    }

    /// Sign the claims and format the token string.
    pub fn sign(&self, key: &[u8]) -> String {
        let payload = self.payload();
        let signature = ring::hmac::sign(
            &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
            payload.as_bytes(),
        );
        format!(
            "{payload}.{}",
            fast32::base64::RFC4648_NOPAD.encode(signature.as_ref())
        )
    }

    /// Parse a token string into its claims and raw signature bytes.
    ///
    /// This does **not** verify the signature - call [`verify`](Self::verify)
    /// for that.
    pub fn parse(token: &str) -> Result<(Self, Box<[u8]>), TokenError> {
        let mut parts = token.splitn(3, '.');
        let (Some(user_id), Some(expires_at), Some(signature)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::InvalidFormat);
        };
        let user_id: i64 = user_id.parse().map_err(|_| TokenError::InvalidFormat)?;
        let expires_at: i64 = expires_at.parse().map_err(|_| TokenError::InvalidFormat)?;
        let signature = fast32::base64::RFC4648_NOPAD
            .decode_str(signature)
            .map_err(|_| TokenError::InvalidBase64)?
            .into_boxed_slice();
        Ok((
            Self {
                user_id,
                expires_at,
            },
            signature,
        ))
    }

    /// Verify a token string against `key` and the current time.
    pub fn verify(token: &str, key: &[u8]) -> Result<Self, TokenError> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        Self::verify_at(token, key, now)
    }

    /// Verify a token string against `key`, treating `now` as the current
    /// unix timestamp.
    pub fn verify_at(token: &str, key: &[u8], now: i64) -> Result<Self, TokenError> {
        let (claims, signature) = Self::parse(token)?;
        ring::hmac::verify(
            &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
            claims.payload().as_bytes(),
            signature.as_ref(),
        )?;
        if now >= claims.expires_at {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

/// Format an `Authorization` header value for `token`.
pub fn bearer_header(token: &str) -> String {
    format!("{BEARER_PREFIX}{token}")
}

/// Extract the token from an `Authorization` header value.
pub fn strip_bearer(value: &str) -> Result<&str, TokenError> {
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(TokenError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_sign_and_verify() {
        let claims = SessionToken::new(42, 60);
        let token = claims.sign(KEY);
        assert_eq!(SessionToken::verify(&token, KEY), Ok(claims));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let token = SessionToken::new(42, 60).sign(KEY);
        assert_eq!(
            SessionToken::verify(&token, b"another-secret-entirely"),
            Err(TokenError::SignatureMismatch)
        );
    }

    #[test]
    fn test_tampered_user_id_is_rejected() {
        let token = SessionToken::new(42, 60).sign(KEY);
        let tampered = token.replacen("42.", "43.", 1);
        assert_eq!(
            SessionToken::verify(&tampered, KEY),
            Err(TokenError::SignatureMismatch)
        );
    }

    #[test]
    fn test_expired_token() {
        let claims = SessionToken {
            user_id: 7,
            expires_at: 1_000,
        };
        let token = claims.sign(KEY);
        assert_eq!(SessionToken::verify_at(&token, KEY, 999), Ok(claims));
        assert_eq!(
            SessionToken::verify_at(&token, KEY, 1_000),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(
            SessionToken::verify("garbage", KEY),
            Err(TokenError::InvalidFormat)
        );
        assert_eq!(
            SessionToken::verify("1.2.!!!", KEY),
            Err(TokenError::InvalidBase64)
        );
        assert_eq!(
            SessionToken::verify("x.2.AAAA", KEY),
            Err(TokenError::InvalidFormat)
        );
    }

    #[test]
    fn test_bearer_header_round_trip() {
        let header = bearer_header("abc.def");
        assert_eq!(strip_bearer(&header), Ok("abc.def"));
        assert_eq!(strip_bearer("Basic abc"), Err(TokenError::InvalidFormat));
        assert_eq!(strip_bearer("Bearer "), Err(TokenError::InvalidFormat));
    }
}
