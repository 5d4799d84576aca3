//! Shared types for the club activities backend.
//!
//! - [`objects`] - JSON request/response bodies of every endpoint.
//! - [`token`] - bearer session tokens (HMAC-SHA256).
//! - `client` - typed HTTP clients, behind the `client` feature.

pub mod objects;
pub mod token;

#[cfg(feature = "client")]
pub mod client;
