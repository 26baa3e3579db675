//! Request and response types for the Bravo Zero platform APIs.
//!
//! Pure serde types: no HTTP client, no I/O. The `bravozero` crate sends
//! them; the conformance harness serves them.
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | POST | `/v1/constitution/evaluate` | [`EvaluateBody`] → [`EvaluationResult`] |
//! | GET | `/v1/constitution/omega` | → [`OmegaScore`] |
//! | GET | `/v1/constitution/rules` | [`RuleFilter`] → `Vec<`[`Rule`]`>` |
//! | GET | `/v1/constitution/rules/{id}` | → [`Rule`] |
//! | POST | `/v1/memory/record` | [`RecordRequest`] → [`Memory`] |
//! | POST | `/v1/memory/query` | [`QueryRequest`] → [`QueryResponse`] |
//! | GET | `/v1/memory/{id}` | → [`Memory`] |
//! | DELETE | `/v1/memory/{id}` | → empty |
//! | POST | `/v1/memory/edges` | [`CreateEdgeRequest`] → [`Edge`] |
//! | GET | `/v1/bridge/files` | `path`, `recursive`, `pattern` → [`DirectoryListing`] |
//! | GET | `/v1/bridge/file` | `path` → [`FileContent`] |
//! | GET | `/v1/bridge/file/bytes` | `path` → raw bytes |
//! | PUT | `/v1/bridge/file` | [`WriteFileRequest`] → [`FileInfo`] |
//! | DELETE | `/v1/bridge/file` | `path` → empty |
//! | POST | `/v1/bridge/sync` | [`SyncRequest`] → [`SyncStatus`] |
//!
//! Error statuses carry an [`ErrorResponse`] body.

pub mod bridge;
pub mod constitution;
pub mod error;
pub mod memory;
pub mod time;

pub use bridge::{DirectoryListing, FileContent, FileInfo, SyncRequest, SyncStatus, WriteFileRequest};
pub use constitution::{
    AppliedRule, Decision, EvaluateBody, EvaluateRequest, EvaluationResult, OmegaScore, Rule,
    RuleFilter,
};
pub use error::ErrorResponse;
pub use memory::{
    ConsolidationState, CreateEdgeRequest, Edge, Memory, MemoryQueryResult, MemoryType,
    QueryRequest, QueryResponse, RecordRequest,
};
