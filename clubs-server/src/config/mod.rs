//! Configuration module for clubs-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{AdminConfig, AuthConfig, ServerConfig, SharedConfig};
use clubs_core::credentials::hash_secret;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Minimum length of the token signing key, in bytes.
pub const MIN_TOKEN_SECRET_LEN: usize = 16;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub auth: AuthConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(self.server, self.admin, self.auth)
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = hash_secret(&file_config.admin.secret)
                .map_err(|e| ConfigError::HashError(e.to_string()))?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        Ok(build_loaded_config(file_config, secret_hash))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.admin.secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "admin.secret must not be empty".to_string(),
        ));
    }
    if config.auth.token_secret.len() < MIN_TOKEN_SECRET_LEN {
        return Err(ConfigError::ValidationError(format!(
            "auth.token_secret must be at least {MIN_TOKEN_SECRET_LEN} bytes"
        )));
    }
    if config.auth.token_ttl_secs <= 0 {
        return Err(ConfigError::ValidationError(
            "auth.token_ttl_secs must be positive".to_string(),
        ));
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig, secret_hash: String) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        admin: AdminConfig::new(secret_hash),
        auth: AuthConfig::new(
            file_config.auth.token_secret.into_bytes(),
            file_config.auth.token_ttl_secs,
        ),
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "clubs-config-{}-{name}.toml",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_plaintext_admin_secret_is_hashed_and_rewritten() {
        let path = write_config(
            "hash",
            r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "let-me-in"

[auth]
token_secret = "0123456789abcdef"
"#,
        );
        let loader = ConfigLoader::new(&path, Some("127.0.0.1:4000".parse().unwrap()));
        let loaded = loader.load().unwrap();
        assert_eq!(loaded.server.listen.port(), 4000);
        assert!(loaded.admin.verify_secret("let-me-in"));

        let rewritten: FileConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(rewritten.is_admin_secret_hashed());
        // The override is not persisted.
        assert_eq!(rewritten.server.listen.port(), 3000);

        // A second load keeps the existing hash.
        let reloaded = loader.reload().unwrap();
        assert_eq!(reloaded.admin.secret_hash, rewritten.admin.secret);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_short_token_secret_is_rejected() {
        let path = write_config(
            "short",
            r#"
[admin]
secret = "let-me-in"

[auth]
token_secret = "short"
"#,
        );
        let result = ConfigLoader::new(&path, None).load();
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
        std::fs::remove_file(&path).unwrap();
    }
}
