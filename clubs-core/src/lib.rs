#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod arbiter;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod directory;
pub mod entities;
pub mod error;
pub mod export;
pub mod framework;
pub mod ledger;
pub mod memory;
pub mod stats;

pub use arbiter::CapacityArbiter;
pub use catalog::EventCatalog;
pub use directory::UserDirectory;
pub use error::{ClubError, ConflictReason, ErrorKind, Resource, StoreError};
pub use ledger::RegistrationLedger;
