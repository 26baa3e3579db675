//! Errors returned by the in-process platform, rendered as the platform's
//! JSON error body.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bravozero_api::error::codes;
use bravozero_api::ErrorResponse;

/// `Retry-After` sent with a 429; differs from the SDK's fixed 60 s report.
pub const RETRY_AFTER_SECS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Missing or wrong API key, or no agent id.
    Unauthorized(String),
    /// The attestation header is missing, malformed, stale or badly signed.
    InvalidAttestation(String),
    /// The attestation's nonce was already accepted for this agent.
    ReplayedNonce,
    RateLimited,
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            PlatformError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, msg),
            PlatformError::InvalidAttestation(msg) => {
                (StatusCode::UNAUTHORIZED, codes::INVALID_ATTESTATION, msg)
            }
            PlatformError::ReplayedNonce => (
                StatusCode::UNAUTHORIZED,
                codes::REPLAYED_NONCE,
                "replayed nonce".to_string(),
            ),
            PlatformError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                codes::RATE_LIMIT_EXCEEDED,
                "rate limit exceeded".to_string(),
            ),
            PlatformError::NotFound(msg) => (StatusCode::NOT_FOUND, codes::NOT_FOUND, msg),
            PlatformError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_parameter", msg),
        };
        let mut response = (status, Json(ErrorResponse::new(message).with_code(code))).into_response();
        if status == StatusCode::TOO_MANY_REQUESTS {
            response
                .headers_mut()
                .insert("retry-after", HeaderValue::from(RETRY_AFTER_SECS));
        }
        response
    }
}
