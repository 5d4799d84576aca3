//! TOML file configuration structures.
//!
//! These structs directly map to the `clubs-config.toml` file format.

use clubs_core::credentials::is_argon2_hash;
use clubs_sdk::token::DEFAULT_TOKEN_TTL;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub auth: AuthConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The key required to create admin accounts. If this is plaintext
    /// (doesn't start with `$argon2`), it will be hashed and the config file
    /// will be rewritten.
    pub secret: String,
}

/// Session token section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for bearer tokens.
    pub token_secret: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,
}

fn default_token_ttl() -> i64 {
    DEFAULT_TOKEN_TTL
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        is_argon2_hash(&self.admin.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "test-secret"

[auth]
token_secret = "0123456789abcdef0123"
token_ttl_secs = 600
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.auth.token_ttl_secs, 600);
        assert!(!config.is_admin_secret_hashed());
    }

    #[test]
    fn test_defaults() {
        let toml_str = r#"
[admin]
secret = "$argon2id$v=19$m=19456,t=2,p=1$abc123"

[auth]
token_secret = "0123456789abcdef"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.auth.token_ttl_secs, DEFAULT_TOKEN_TTL);
        assert!(config.is_admin_secret_hashed());
    }

    #[test]
    fn test_missing_auth_section_is_an_error() {
        let toml_str = r#"
[admin]
secret = "test-secret"
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }
}
