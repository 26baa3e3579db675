//! The SDK's error taxonomy.
//!
//! Every failed call yields exactly one [`Error`] variant. Nothing is retried
//! inside the SDK: [`Error::is_retryable`] is a hint for the caller's own
//! policy, since a governance evaluation may have side effects that a blind
//! retry would repeat.
//!
//! | Variant | Raised by | Status |
//! |---|---|---|
//! | [`Config`](Error::Config), [`KeyParse`](Error::KeyParse) | client construction (fatal) | none |
//! | [`Serialization`](Error::Serialization), [`Attestation`](Error::Attestation) | local encoding, nothing sent | none |
//! | [`Network`](Error::Network) | no response obtained | none |
//! | [`Cancelled`](Error::Cancelled) | caller's token fired | none |
//! | [`RateLimited`](Error::RateLimited) | HTTP 429 | 429 |
//! | [`Http`](Error::Http) | HTTP ≥ 400 | status |
//! | [`Decode`](Error::Decode) | 2xx body did not match the expected shape | none |
//! | [`NotFound`](Error::NotFound) | 404 on a by-id lookup (sub-clients) | 404 |
//! | [`AuthenticationFailed`](Error::AuthenticationFailed) | 401/403 (sub-clients) | none |
//! | [`Denied`](Error::Denied) | constitution decision `deny` | none |

use std::time::Duration;

use bravozero_api::{ErrorResponse, EvaluationResult};
use bravozero_auth::{AttestationError, KeyParseError};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The client configuration is incomplete or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The private key could not be loaded.
    #[error("failed to initialize authenticator: {0}")]
    KeyParse(#[from] KeyParseError),

    /// The request body could not be encoded as JSON.
    #[error("failed to encode request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The attestation could not be created; the request was not sent.
    #[error("failed to create attestation: {0}")]
    Attestation(#[from] AttestationError),

    /// No HTTP response was obtained (connection, DNS, TLS or timeout).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The caller's cancellation token fired before the call completed.
    #[error("request cancelled")]
    Cancelled,

    /// The server answered 429.
    #[error("rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// The server answered with an error status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A successful response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("authentication error: {message}")]
    AuthenticationFailed { message: String },

    /// The Constitution Agent denied the action. The full evaluation is
    /// attached for inspection.
    #[error("constitution denied: {reasoning}")]
    Denied {
        reasoning: String,
        result: Box<EvaluationResult>,
    },
}

impl Error {
    /// True when the client itself is unusable and no request can succeed
    /// until configuration or key material is fixed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::KeyParse(_))
    }

    /// The HTTP status behind this error, if the server produced one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::RateLimited { .. } => Some(429),
            Error::Http { status, .. } => Some(*status),
            Error::NotFound { .. } => Some(404),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether repeating the same call later could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited { .. } | Error::Network(_) => true,
            Error::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// How long the server asked the caller to wait, for [`Error::RateLimited`].
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimited { retry_after_secs } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }

    /// Take the evaluation out of a [`Error::Denied`], for callers that treat
    /// denial as ordinary data.
    pub fn into_denied_result(self) -> Option<EvaluationResult> {
        match self {
            Error::Denied { result, .. } => Some(*result),
            _ => None,
        }
    }

    /// Map a 401/403 into [`Error::AuthenticationFailed`], using the
    /// server's `error` message when the body carries one.
    pub(crate) fn refine_auth(self) -> Self {
        match self {
            Error::Http { status, body } if status == 401 || status == 403 => {
                let message = ErrorResponse::message_from(&body)
                    .unwrap_or_else(|| format!("HTTP {status}: {body}"));
                Error::AuthenticationFailed { message }
            }
            other => other,
        }
    }

    /// Map a 404 into [`Error::NotFound`] for a lookup of `resource` by `id`.
    pub(crate) fn refine_not_found(self, resource: &'static str, id: &str) -> Self {
        match self {
            Error::Http { status: 404, .. } => Error::NotFound {
                resource,
                id: id.to_string(),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bravozero_api::Decision;

    fn http(status: u16, body: &str) -> Error {
        Error::Http {
            status,
            body: body.into(),
        }
    }

    #[test]
    fn not_found_refinement_only_touches_404() {
        let refined = http(404, r#"{"error":"not found"}"#).refine_not_found("rule", "r-1");
        assert!(matches!(refined, Error::NotFound { resource: "rule", ref id } if id == "r-1"));
        assert_eq!(refined.to_string(), "rule not found: r-1");

        let untouched = http(500, "boom").refine_not_found("rule", "r-1");
        assert!(matches!(untouched, Error::Http { status: 500, .. }));
    }

    #[test]
    fn auth_refinement_prefers_server_message() {
        let refined = http(401, r#"{"error":"replayed nonce","code":"replayed_nonce"}"#).refine_auth();
        assert!(matches!(refined, Error::AuthenticationFailed { ref message } if message == "replayed nonce"));

        let plain = http(403, "forbidden").refine_auth();
        assert!(matches!(plain, Error::AuthenticationFailed { ref message } if message == "HTTP 403: forbidden"));
    }

    #[test]
    fn retry_hints() {
        assert!(Error::RateLimited { retry_after_secs: 60 }.is_retryable());
        assert_eq!(
            Error::RateLimited { retry_after_secs: 60 }.retry_after(),
            Some(Duration::from_secs(60))
        );
        assert!(http(503, "").is_retryable());
        assert!(!http(400, "").is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn status_codes() {
        assert_eq!(Error::RateLimited { retry_after_secs: 60 }.status_code(), Some(429));
        assert_eq!(http(418, "").status_code(), Some(418));
        assert_eq!(Error::Cancelled.status_code(), None);
        assert_eq!(Error::Config("x".into()).status_code(), None);
    }

    #[test]
    fn denied_result_can_be_recovered() {
        let result: EvaluationResult =
            serde_json::from_str(r#"{"decision":"deny","reasoning":"policy X"}"#).unwrap();
        let err = Error::Denied {
            reasoning: result.reasoning.clone(),
            result: Box::new(result),
        };
        assert_eq!(err.to_string(), "constitution denied: policy X");
        assert!(!err.is_fatal());
        let recovered = err.into_denied_result().unwrap();
        assert_eq!(recovered.decision, Decision::Deny);
    }
}
