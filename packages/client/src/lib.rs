//! Rust SDK for the Bravo Zero agent platform.
//!
//! Every request carries the agent's API key and id and, when a private key
//! is configured, a fresh PERSONA attestation (`X-Persona-Attestation`)
//! signed with Ed25519. Responses are classified into one [`Error`] variant
//! per failure; nothing is retried automatically.
//!
//! | Sub-client | Prefix | Purpose |
//! |---|---|---|
//! | [`ConstitutionClient`] | `/v1/constitution` | Governance evaluation, Ω score, rules |
//! | [`MemoryClient`] | `/v1/memory` | Record, query and link memories |
//! | [`BridgeClient`] | `/v1/bridge` | Virtual filesystem |
//!
//! A constitution `deny` is surfaced as [`Error::Denied`] so that it cannot
//! be mistaken for a permit by code that only checks `is_ok()`.
//!
//! Calls are plain `async fn`s that complete before returning; bind a
//! [`CancellationToken`] with `with_cancellation` on any sub-client to abort
//! them early.

pub mod bridge;
pub mod client;
pub mod config;
pub mod constitution;
pub mod error;
pub mod executor;
pub mod memory;

mod service;

#[cfg(test)]
mod test_support;

pub use bridge::BridgeClient;
pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder, Environment, DEFAULT_TIMEOUT};
pub use constitution::ConstitutionClient;
pub use error::{Error, Result};
pub use executor::Executor;
pub use memory::MemoryClient;

pub use bravozero_api as api;
pub use bravozero_api::{
    AppliedRule, ConsolidationState, Decision, DirectoryListing, Edge, EvaluateRequest,
    EvaluationResult, FileInfo, Memory, MemoryQueryResult, MemoryType, OmegaScore, QueryRequest,
    RecordRequest, Rule, RuleFilter, SyncStatus,
};
pub use bravozero_auth as auth;
pub use bravozero_auth::{Authenticator, FixedClock, SystemClock};
pub use tokio_util::sync::CancellationToken;
