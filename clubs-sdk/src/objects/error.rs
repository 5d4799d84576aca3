//! Error body returned by every failing endpoint.

use serde::{Deserialize, Serialize};

/// JSON error body.
///
/// `error` is the stable error kind (`not-found`, `conflict`,
/// `invalid-state`, `validation`, `unauthorized`, `forbidden`, `internal`).
/// `reason` narrows it down where the kind alone is ambiguous, e.g. a
/// `conflict` with reason `full` versus `already-registered`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub message: String,
}
