//! Application state shared across all request handlers.

use crate::config::runtime::SharedConfig;
use clubs_core::framework::DatabaseProcessor;
use clubs_core::{CapacityArbiter, EventCatalog, RegistrationLedger, UserDirectory};
use sqlx::PgPool;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
}

impl AppState {
    /// Create a new AppState with the given database pool and configuration.
    pub fn new(db: PgPool, config: SharedConfig) -> Self {
        Self { db, config }
    }

    pub fn processor(&self) -> DatabaseProcessor {
        DatabaseProcessor {
            pool: self.db.clone(),
        }
    }

    pub fn catalog(&self) -> EventCatalog<DatabaseProcessor> {
        EventCatalog::new(self.processor())
    }

    pub fn ledger(&self) -> RegistrationLedger<DatabaseProcessor> {
        RegistrationLedger::new(self.processor())
    }

    pub fn arbiter(&self) -> CapacityArbiter<DatabaseProcessor> {
        CapacityArbiter::new(self.processor())
    }

    pub fn directory(&self) -> UserDirectory<DatabaseProcessor> {
        UserDirectory::new(self.processor())
    }
}
