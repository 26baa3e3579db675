//! PERSONA attestation payloads and their transport encoding.
//!
//! An attestation is produced in three steps:
//!
//! 1. The [`AttestationPayload`] is canonicalized with JCS (RFC 8785), which
//!    sorts object keys lexicographically. The server recomputes the same
//!    bytes independently before verifying.
//! 2. The canonical bytes are signed with Ed25519.
//! 3. Payload and signature are base64-encoded into an [`Attestation`]
//!    envelope, which is serialized to JSON and base64-encoded again to form
//!    the `X-Persona-Attestation` header value.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};

use crate::clock::ClockReading;
use crate::error::AttestationError;

/// The only signature algorithm the platform accepts.
pub const ALGORITHM: &str = "Ed25519";

/// The signed claims of one attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationPayload {
    /// The operation being attested. Omitted from the wire when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    pub agent_id: String,

    /// `"{timestamp}-{unix_nanos}"`; unique per attestation.
    pub nonce: String,

    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

impl AttestationPayload {
    /// Build the payload for `agent_id` at `reading`. An empty `action` is
    /// left out entirely rather than sent as `""`.
    pub fn new(agent_id: &str, action: &str, reading: ClockReading) -> Self {
        Self {
            action: (!action.is_empty()).then(|| action.to_string()),
            agent_id: agent_id.to_string(),
            nonce: reading.nonce(),
            timestamp: reading.unix_secs(),
        }
    }

    /// The exact bytes that get signed.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, AttestationError> {
        let value = serde_json::to_value(self).map_err(AttestationError::Payload)?;
        canonicalize(&value)
    }
}

/// The transport envelope: base64 payload, base64 signature, algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub payload: String,
    pub signature: String,
    pub algorithm: String,
}

impl Attestation {
    /// Sign `payload` with `signing_key`.
    pub fn sign(
        payload: &AttestationPayload,
        signing_key: &SigningKey,
    ) -> Result<Self, AttestationError> {
        let bytes = payload.canonical_bytes()?;
        let signature = signing_key.sign(&bytes);

        Ok(Self {
            payload: BASE64.encode(&bytes),
            signature: BASE64.encode(signature.to_bytes()),
            algorithm: ALGORITHM.to_string(),
        })
    }

    /// Encode the envelope as the header value: `base64(JSON(self))`.
    pub fn to_header_value(&self) -> Result<String, AttestationError> {
        let json = serde_json::to_vec(self).map_err(AttestationError::Envelope)?;
        Ok(BASE64.encode(json))
    }
}

/// JCS-canonicalize an arbitrary JSON value.
///
/// Object keys come out sorted regardless of the order they were inserted
/// in, so the same logical value always yields the same bytes.
pub fn canonicalize(value: &serde_json::Value) -> Result<Vec<u8>, AttestationError> {
    serde_jcs::to_vec(value).map_err(AttestationError::Payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn reading() -> ClockReading {
        ClockReading::from_unix_nanos(1_700_000_000_123_456_789)
    }

    #[test]
    fn canonical_bytes_are_key_sorted() {
        let payload = AttestationPayload::new("agent-1", "read", reading());
        let bytes = payload.canonical_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"action":"read","agent_id":"agent-1","nonce":"1700000000-1700000000123456789","timestamp":1700000000}"#
        );
    }

    #[test]
    fn empty_action_is_omitted() {
        let payload = AttestationPayload::new("agent-1", "", reading());
        assert_eq!(payload.action, None);
        let bytes = payload.canonical_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"agent_id":"agent-1","nonce":"1700000000-1700000000123456789","timestamp":1700000000}"#
        );
    }

    #[test]
    fn canonicalization_ignores_insertion_order() {
        let entries = [
            ("timestamp", json!(1_700_000_000u64)),
            ("nonce", json!("1700000000-1")),
            ("agent_id", json!("agent-1")),
            ("action", json!("write")),
        ];

        let mut forward = Map::new();
        for (k, v) in entries.iter() {
            forward.insert((*k).to_string(), v.clone());
        }
        let mut backward = Map::new();
        for (k, v) in entries.iter().rev() {
            backward.insert((*k).to_string(), v.clone());
        }

        let a = canonicalize(&Value::Object(forward)).unwrap();
        let b = canonicalize(&Value::Object(backward)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn struct_and_map_forms_agree() {
        let payload = AttestationPayload::new("agent-1", "write", reading());
        let as_map = json!({
            "timestamp": payload.timestamp,
            "agent_id": payload.agent_id,
            "action": "write",
            "nonce": payload.nonce,
        });
        assert_eq!(payload.canonical_bytes().unwrap(), canonicalize(&as_map).unwrap());
    }

    #[test]
    fn header_value_decodes_to_envelope() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let payload = AttestationPayload::new("agent-1", "", reading());
        let attestation = Attestation::sign(&payload, &key).unwrap();

        let header = attestation.to_header_value().unwrap();
        let json = BASE64.decode(header).unwrap();
        let back: Attestation = serde_json::from_slice(&json).unwrap();

        assert_eq!(back, attestation);
        assert_eq!(back.algorithm, "Ed25519");
        assert_eq!(BASE64.decode(&back.signature).unwrap().len(), 64);
        assert_eq!(
            BASE64.decode(&back.payload).unwrap(),
            payload.canonical_bytes().unwrap()
        );
    }
}
