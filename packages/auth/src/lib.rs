//! PERSONA attestation signing for Bravo Zero agents.
//!
//! This crate has **no network I/O** and no async runtime. It turns an
//! agent id plus an Ed25519 private key into `X-Persona-Attestation` header
//! values; the HTTP layer in the `bravozero` crate attaches them to
//! requests.
//!
//! | Item | Purpose |
//! |---|---|
//! | [`Authenticator`] | Holds the key, creates attestations |
//! | [`AttestationPayload`], [`Attestation`] | Signed claims and transport envelope |
//! | [`Clock`], [`SystemClock`], [`FixedClock`] | Timestamp and nonce source |

pub mod attestation;
pub mod authenticator;
pub mod clock;
pub mod error;

pub use attestation::{canonicalize, Attestation, AttestationPayload, ALGORITHM};
pub use authenticator::Authenticator;
pub use clock::{Clock, ClockReading, FixedClock, SystemClock};
pub use error::{AttestationError, KeyParseError};
