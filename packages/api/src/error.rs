//! Error response body returned by the platform on 4xx/5xx.

use serde::{Deserialize, Serialize};

/// The JSON body the platform sends with error statuses.
///
/// ```json
/// { "error": "not found", "code": "not_found" }
/// ```
///
/// `code` is optional; older endpoints send only `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of the problem.
    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// The `error` message from a raw body, if it parses as an
    /// [`ErrorResponse`].
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<Self>(body).ok().map(|e| e.error)
    }
}

/// Error codes the platform is known to send.
pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const INVALID_ATTESTATION: &str = "invalid_attestation";
    pub const REPLAYED_NONCE: &str = "replayed_nonce";
    pub const RATE_LIMIT_EXCEEDED: &str = "rate_limit_exceeded";
}
