//! Memory Service types: `/v1/memory/*` (the Trace Manifold).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_IMPORTANCE: f64 = 0.5;
pub const DEFAULT_QUERY_LIMIT: u32 = 10;
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.5;
pub const DEFAULT_EDGE_STRENGTH: f64 = 0.5;

/// Kind of memory.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    Episodic,
    #[default]
    Semantic,
    Procedural,
    Working,
    /// A kind this SDK does not know yet.
    #[serde(other)]
    Unknown,
}

/// Where a memory sits in its consolidation lifecycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConsolidationState {
    #[default]
    Active,
    Consolidating,
    Consolidated,
    Decaying,
    Dormant,
    /// A state this SDK does not know yet.
    #[serde(other)]
    Unknown,
}

/// A stored memory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub memory_type: MemoryType,
    #[serde(default)]
    pub importance: f64,
    #[serde(default)]
    pub strength: f64,
    #[serde(default)]
    pub consolidation_state: ConsolidationState,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, with = "crate::time")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::time")]
    pub last_accessed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub access_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f64>>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// One hit from a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryQueryResult {
    pub memory: Memory,
    pub relevance: f64,
}

/// Response body for `POST /v1/memory/query`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<MemoryQueryResult>,
}

/// A weighted relationship between two memories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub strength: f64,
    #[serde(default, with = "crate::time")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::time")]
    pub last_strengthened_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /v1/memory/record`.
///
/// Zero importance and an empty namespace are treated as "unset" and
/// replaced by [`apply_defaults`](Self::apply_defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    pub content: String,
    pub memory_type: MemoryType,
    pub importance: f64,
    pub namespace: String,
    pub tags: Vec<String>,
    pub metadata: Map<String, Value>,
}

impl RecordRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Fill unset fields: importance 0.5, namespace = the recording agent.
    pub fn apply_defaults(&mut self, agent_id: &str) {
        if self.importance == 0.0 {
            self.importance = DEFAULT_IMPORTANCE;
        }
        if self.namespace.is_empty() {
            self.namespace = agent_id.to_string();
        }
    }
}

/// Request body for `POST /v1/memory/query`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    pub limit: u32,
    pub min_relevance: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memory_types: Vec<MemoryType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Fill unset fields: limit 10, minimum relevance 0.5.
    pub fn apply_defaults(&mut self) {
        if self.limit == 0 {
            self.limit = DEFAULT_QUERY_LIMIT;
        }
        if self.min_relevance == 0.0 {
            self.min_relevance = DEFAULT_MIN_RELEVANCE;
        }
    }
}

/// Request body for `POST /v1/memory/edges`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateEdgeRequest {
    pub source_id: String,
    pub target_id: String,
    pub relationship: String,
    pub strength: f64,
}
