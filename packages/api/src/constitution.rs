//! Constitution Agent types: `/v1/constitution/*`.
//!
//! The Constitution Agent evaluates an agent's intended action against the
//! platform's governance rules and returns exactly one terminal
//! [`Decision`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default evaluation priority when the caller does not set one.
pub const DEFAULT_PRIORITY: &str = "normal";

/// Outcome of a constitution evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Permit,
    Deny,
    Escalate,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Permit => "permit",
            Decision::Deny => "deny",
            Decision::Escalate => "escalate",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule that took part in an evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRule {
    pub rule_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub matched: bool,
    /// Signed contribution of this rule to the final decision.
    #[serde(default)]
    pub contribution: f64,
}

/// Response body for `POST /v1/constitution/evaluate`.
///
/// # Example
///
/// ```json
/// {
///   "requestId": "eval-123",
///   "decision": "deny",
///   "confidence": 0.92,
///   "alignmentScore": 0.31,
///   "appliedRules": [{"ruleId": "r-7", "name": "no-prod-writes", "matched": true, "contribution": -0.6}],
///   "reasoning": "policy X",
///   "evaluatedAt": "2026-02-18T12:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    #[serde(default)]
    pub request_id: String,
    pub decision: Decision,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub alignment_score: f64,
    #[serde(default)]
    pub applied_rules: Vec<AppliedRule>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, with = "crate::time")]
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// Response body for `GET /v1/constitution/omega`: the global alignment score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OmegaScore {
    pub omega: f64,
    #[serde(default)]
    pub components: HashMap<String, f64>,
    #[serde(default)]
    pub trend: String,
    #[serde(default, with = "crate::time")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// What the caller wants evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluateRequest {
    pub action: String,
    pub context: Map<String, Value>,
    /// Defaults to [`DEFAULT_PRIORITY`].
    pub priority: Option<String>,
}

impl EvaluateRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// The wire body, stamped with the evaluating agent's id.
    pub fn into_body(self, agent_id: &str) -> EvaluateBody {
        EvaluateBody {
            agent_id: agent_id.to_string(),
            action: self.action,
            context: self.context,
            priority: self.priority.unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
        }
    }
}

/// Request body for `POST /v1/constitution/evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateBody {
    pub agent_id: String,
    pub action: String,
    pub context: Map<String, Value>,
    pub priority: String,
}

/// A constitution rule, as returned by `GET /v1/constitution/rules[/{id}]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub active: bool,
}

/// Optional filters for `GET /v1/constitution/rules`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFilter {
    pub category: Option<String>,
    pub priority: Option<String>,
}

impl RuleFilter {
    /// Non-empty filters as `(name, value)` query pairs, in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [("category", &self.category), ("priority", &self.priority)]
            .into_iter()
            .filter_map(|(name, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (name, v))
            })
            .collect()
    }
}
