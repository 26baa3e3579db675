//! Error types for key loading and attestation creation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned while turning PEM key material into an [`Authenticator`].
///
/// All of these are fatal: an authenticator is never constructed from key
/// material that failed to parse.
///
/// [`Authenticator`]: crate::Authenticator
#[derive(Debug, Error)]
pub enum KeyParseError {
    #[error("invalid PEM format: missing BEGIN/END PRIVATE KEY markers")]
    MissingMarkers,

    #[error("failed to decode base64 key body: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("private key data too short: got {0} bytes, need at least 32")]
    TooShort(usize),

    #[error("failed to read private key file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned by [`Authenticator::create_attestation`].
///
/// A request whose attestation fails must be aborted, never sent unsigned.
///
/// [`Authenticator::create_attestation`]: crate::Authenticator::create_attestation
#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("system clock reads before the Unix epoch")]
    ClockBeforeEpoch,

    #[error("failed to canonicalize attestation payload: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("failed to serialize attestation envelope: {0}")]
    Envelope(#[source] serde_json::Error),
}
