//! Runtime configuration re-exports.
//!
//! The actual config types are defined in `clubs_core::config`.

pub use clubs_core::config::{AdminConfig, AuthConfig, ServerConfig, SharedConfig};
