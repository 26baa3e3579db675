//! Server-side checks for incoming requests: API key, agent id and the
//! `X-Persona-Attestation` header.
//!
//! Verification decodes the envelope independently of the signing code and
//! checks, in order:
//!
//! 1. the envelope is base64 JSON `{payload, signature, algorithm}` with
//!    `algorithm == "Ed25519"`;
//! 2. the signature verifies over the decoded payload bytes;
//! 3. the payload bytes are already in canonical (RFC 8785) form;
//! 4. `agent_id` matches `X-Agent-ID`;
//! 5. the timestamp is within the allowed skew and the nonce starts with it.
//!
//! Replay detection needs shared state and lives in the [`gate`] middleware.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bravozero::executor::headers;
use bravozero_auth::{canonicalize, Attestation, AttestationPayload, ALGORITHM};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use tracing::debug;

use crate::error::PlatformError;
use crate::{PlatformState, RecordedRequest};

/// Verify one attestation header value for `agent_id` against `key`.
pub fn verify_attestation(
    header: &str,
    agent_id: &str,
    key: &VerifyingKey,
    now_secs: u64,
    max_skew_secs: u64,
) -> Result<AttestationPayload, PlatformError> {
    let invalid = |msg: &str| PlatformError::InvalidAttestation(msg.to_string());

    let envelope = BASE64
        .decode(header.trim())
        .map_err(|_| invalid("attestation is not base64"))?;
    let envelope: Attestation =
        serde_json::from_slice(&envelope).map_err(|_| invalid("attestation is not a JSON envelope"))?;
    if envelope.algorithm != ALGORITHM {
        return Err(invalid("unsupported algorithm"));
    }

    let payload_bytes = BASE64
        .decode(&envelope.payload)
        .map_err(|_| invalid("payload is not base64"))?;
    let signature_bytes = BASE64
        .decode(&envelope.signature)
        .map_err(|_| invalid("signature is not base64"))?;
    let signature = Signature::from_slice(&signature_bytes).map_err(|_| invalid("malformed signature"))?;
    key.verify(&payload_bytes, &signature)
        .map_err(|_| invalid("signature verification failed"))?;

    let value: serde_json::Value =
        serde_json::from_slice(&payload_bytes).map_err(|_| invalid("payload is not JSON"))?;
    let canonical = canonicalize(&value).map_err(|_| invalid("payload is not canonicalizable"))?;
    if canonical != payload_bytes {
        return Err(invalid("payload is not canonical"));
    }
    let payload: AttestationPayload =
        serde_json::from_value(value).map_err(|_| invalid("payload is missing fields"))?;

    if payload.agent_id != agent_id {
        return Err(invalid("attestation agent does not match X-Agent-ID"));
    }
    if payload.timestamp.abs_diff(now_secs) > max_skew_secs {
        return Err(invalid("attestation timestamp outside allowed window"));
    }
    if !payload.nonce.starts_with(&format!("{}-", payload.timestamp)) {
        return Err(invalid("nonce does not match timestamp"));
    }
    Ok(payload)
}

fn header<'a>(map: &'a HeaderMap, name: &str) -> Option<&'a str> {
    map.get(name).and_then(|v| v.to_str().ok())
}

/// Authenticate a request against the platform state.
fn authenticate(state: &PlatformState, map: &HeaderMap) -> Result<Option<AttestationPayload>, PlatformError> {
    if state.is_rate_limited() {
        return Err(PlatformError::RateLimited);
    }
    if header(map, headers::API_KEY) != Some(state.api_key.as_str()) {
        return Err(PlatformError::Unauthorized("invalid API key".into()));
    }
    let agent_id = header(map, headers::AGENT_ID)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PlatformError::Unauthorized("missing agent id".into()))?;

    let Some(attestation) = header(map, headers::ATTESTATION) else {
        return if state.require_attestation {
            Err(PlatformError::InvalidAttestation("attestation required".into()))
        } else {
            Ok(None)
        };
    };
    let key = state
        .keys
        .get(agent_id)
        .ok_or_else(|| PlatformError::InvalidAttestation(format!("unknown agent {agent_id}")))?;

    let payload = verify_attestation(
        attestation,
        agent_id,
        key,
        chrono::Utc::now().timestamp().max(0) as u64,
        state.max_skew_secs,
    )?;
    if !state.accept_nonce(agent_id, &payload.nonce) {
        return Err(PlatformError::ReplayedNonce);
    }
    Ok(Some(payload))
}

/// Axum `from_fn_with_state` middleware: authenticate, record, then route.
pub async fn gate(State(state): State<Arc<PlatformState>>, req: Request, next: Next) -> Response {
    let outcome = authenticate(&state, req.headers());

    state.record(RecordedRequest {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        query: req.uri().query().map(str::to_string),
        agent_id: header(req.headers(), headers::AGENT_ID).map(str::to_string),
        user_agent: header(req.headers(), "user-agent").map(str::to_string),
        attestation: outcome.as_ref().ok().cloned().flatten(),
        accepted: outcome.is_ok(),
    });

    match outcome {
        Ok(_) => next.run(req).await,
        Err(e) => {
            debug!(path = %req.uri().path(), error = ?e, "request rejected");
            e.into_response()
        }
    }
}
