//! Clock readings used to timestamp attestations and derive nonces.
//!
//! A nonce is `"{seconds}-{nanoseconds}"`, both read from one clock sample.
//! [`SystemClock`] never hands out the same nanosecond value twice: it keeps
//! a lock-free high-water mark of issued values and bumps a repeated or
//! regressed OS reading by one nanosecond. Two attestations from the same
//! authenticator therefore always carry distinct nonces, no matter how
//! coarse the platform clock is.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::AttestationError;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// One sample of wall-clock time, in nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockReading {
    unix_nanos: u64,
}

impl ClockReading {
    pub fn from_unix_nanos(unix_nanos: u64) -> Self {
        Self { unix_nanos }
    }

    /// Whole seconds since the epoch; the attestation `timestamp`.
    pub fn unix_secs(&self) -> u64 {
        self.unix_nanos / NANOS_PER_SEC
    }

    pub fn unix_nanos(&self) -> u64 {
        self.unix_nanos
    }

    /// The attestation nonce for this reading.
    pub fn nonce(&self) -> String {
        format!("{}-{}", self.unix_secs(), self.unix_nanos)
    }
}

/// Source of time for attestations.
///
/// Implementations must be safe to call concurrently.
pub trait Clock: Send + Sync {
    fn now(&self) -> Result<ClockReading, AttestationError>;
}

/// The operating-system wall clock, with a per-instance uniqueness guard.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_issued: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Result<ClockReading, AttestationError> {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AttestationError::ClockBeforeEpoch)?;
        let observed = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);

        let next = |last: u64| observed.max(last.saturating_add(1));
        let last = self
            .last_issued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(next(last)))
            .unwrap_or_else(|last| last);

        Ok(ClockReading::from_unix_nanos(next(last)))
    }
}

/// A clock frozen at one reading. Attestations created with it are
/// reproducible byte for byte.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub ClockReading);

impl Clock for FixedClock {
    fn now(&self) -> Result<ClockReading, AttestationError> {
        Ok(self.0)
    }
}
