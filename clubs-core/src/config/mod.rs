//! Configuration types for the club activities server.
//!
//! These types represent the validated runtime configuration used by the server
//! and can be shared across crates. The actual config loading/parsing is handled
//! by the server crate.

mod admin;
mod auth;
mod server;

pub use admin::AdminConfig;
pub use auth::AuthConfig;
pub use server::ServerConfig;

use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    /// Server configuration (listen address).
    pub server: Arc<RwLock<ServerConfig>>,
    /// Admin registration secret.
    pub admin: Arc<RwLock<AdminConfig>>,
    /// Session token signing.
    pub auth: Arc<RwLock<AuthConfig>>,
}

impl SharedConfig {
    pub fn new(server: ServerConfig, admin: AdminConfig, auth: AuthConfig) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            admin: Arc::new(RwLock::new(admin)),
            auth: Arc::new(RwLock::new(auth)),
        }
    }

    pub async fn server(&self) -> RwLockReadGuard<'_, ServerConfig> {
        self.server.read().await
    }

    pub async fn admin(&self) -> RwLockReadGuard<'_, AdminConfig> {
        self.admin.read().await
    }

    pub async fn auth(&self) -> RwLockReadGuard<'_, AuthConfig> {
        self.auth.read().await
    }

    /// Replace every section. Sections are written one after another, never
    /// holding two write locks at once.
    pub async fn update_all(&self, server: ServerConfig, admin: AdminConfig, auth: AuthConfig) {
        *self.server.write().await = server;
        *self.admin.write().await = admin;
        *self.auth.write().await = auth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_all_replaces_sections() {
        let config = SharedConfig::new(
            ServerConfig {
                listen: "127.0.0.1:8080".parse().unwrap(),
            },
            AdminConfig::new("$argon2id$old".to_string()),
            AuthConfig::new(b"0123456789abcdef".to_vec(), 60),
        );
        let reader = config.clone();

        config
            .update_all(
                ServerConfig {
                    listen: "127.0.0.1:9090".parse().unwrap(),
                },
                AdminConfig::new("$argon2id$new".to_string()),
                AuthConfig::new(b"fedcba9876543210".to_vec(), 120),
            )
            .await;

        assert_eq!(reader.server().await.listen.port(), 9090);
        assert_eq!(reader.admin().await.secret_hash, "$argon2id$new");
        assert_eq!(reader.auth().await.token_ttl_secs, 120);
    }
}
