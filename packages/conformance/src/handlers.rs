//! Endpoint handlers for the in-process platform.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bravozero_api::{
    AppliedRule, Decision, DirectoryListing, Edge, EvaluateBody, EvaluationResult, FileContent,
    FileInfo, Memory, MemoryQueryResult, OmegaScore, QueryRequest, QueryResponse, RecordRequest,
    Rule, SyncRequest, SyncStatus, WriteFileRequest,
};
use bravozero_api::memory::CreateEdgeRequest;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::error::PlatformError;
use crate::{lock, verify, PlatformState};

type AppState = Arc<PlatformState>;
type ApiResult<T> = Result<T, PlatformError>;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/constitution/evaluate", post(evaluate))
        .route("/v1/constitution/omega", get(omega))
        .route("/v1/constitution/rules", get(list_rules))
        .route("/v1/constitution/rules/{id}", get(get_rule))
        .route("/v1/memory/record", post(record))
        .route("/v1/memory/query", post(query))
        .route("/v1/memory/edges", post(create_edge))
        .route("/v1/memory/{id}", get(get_memory).delete(delete_memory))
        .route("/v1/bridge/files", get(list_files))
        .route("/v1/bridge/file", get(read_file).put(write_file).delete(delete_file))
        .route("/v1/bridge/file/bytes", get(read_file_bytes))
        .route("/v1/bridge/sync", post(sync))
        .layer(middleware::from_fn_with_state(state.clone(), verify::gate))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Constitution
// ---------------------------------------------------------------------------

async fn evaluate(State(state): State<AppState>, Json(body): Json<EvaluateBody>) -> Json<EvaluationResult> {
    let applied_rules: Vec<AppliedRule> = state
        .rules
        .iter()
        .filter(|r| r.active)
        .map(|r| {
            let matched = r.action == body.action;
            AppliedRule {
                rule_id: r.id.clone(),
                name: r.name.clone(),
                matched,
                contribution: if matched { -1.0 } else { 0.0 },
            }
        })
        .collect();

    let (decision, reasoning) = match state.denials.get(&body.action) {
        Some(reasoning) => (Decision::Deny, reasoning.clone()),
        None => (Decision::Permit, "no constitutional rule restricts this action".to_string()),
    };
    debug!(agent = %body.agent_id, action = %body.action, %decision, "evaluated");

    Json(EvaluationResult {
        request_id: format!("eval-{}", uuid::Uuid::now_v7()),
        decision,
        confidence: 0.95,
        alignment_score: if decision == Decision::Deny { 0.2 } else { 0.9 },
        applied_rules,
        reasoning,
        evaluated_at: Some(Utc::now()),
    })
}

async fn omega() -> Json<OmegaScore> {
    Json(OmegaScore {
        omega: 0.87,
        components: HashMap::from([("alignment".to_string(), 0.9), ("stability".to_string(), 0.84)]),
        trend: "stable".into(),
        timestamp: Some(Utc::now()),
    })
}

#[derive(Deserialize)]
struct RuleQuery {
    category: Option<String>,
    priority: Option<String>,
}

async fn list_rules(State(state): State<AppState>, Query(q): Query<RuleQuery>) -> Json<Vec<Rule>> {
    let wanted = |want: &Option<String>, have: &str| want.as_deref().map_or(true, |w| w == have);
    Json(
        state
            .rules
            .iter()
            .filter(|r| wanted(&q.category, &r.category) && wanted(&q.priority, &r.priority))
            .cloned()
            .collect(),
    )
}

async fn get_rule(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Rule>> {
    state
        .rules
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| PlatformError::NotFound(format!("rule {id} not found")))
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

async fn record(State(state): State<AppState>, Json(req): Json<RecordRequest>) -> ApiResult<Json<Memory>> {
    if req.content.trim().is_empty() {
        return Err(PlatformError::BadRequest("content must not be empty".into()));
    }
    let memory = Memory {
        id: format!("mem-{}", uuid::Uuid::now_v7()),
        content: req.content,
        memory_type: req.memory_type,
        importance: req.importance,
        strength: 1.0,
        consolidation_state: Default::default(),
        namespace: req.namespace,
        tags: req.tags,
        created_at: Some(Utc::now()),
        last_accessed_at: None,
        access_count: 0,
        embedding: None,
        metadata: req.metadata,
    };
    lock(&state.memories).insert(memory.id.clone(), memory.clone());
    Ok(Json(memory))
}

/// Share of query words that occur in `content`, case-insensitively.
fn relevance(query: &str, content: &str) -> f64 {
    let content = content.to_lowercase();
    let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() {
        return 0.0;
    }
    let hits = words.iter().filter(|w| content.contains(w.as_str())).count();
    hits as f64 / words.len() as f64
}

async fn query(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> Json<QueryResponse> {
    let memories = lock(&state.memories);
    let mut results: Vec<MemoryQueryResult> = memories
        .values()
        .filter(|m| req.namespace.as_deref().map_or(true, |ns| ns == m.namespace))
        .filter(|m| req.memory_types.is_empty() || req.memory_types.contains(&m.memory_type))
        .filter(|m| req.tags.iter().all(|t| m.tags.contains(t)))
        .map(|m| MemoryQueryResult {
            relevance: relevance(&req.query, &m.content),
            memory: m.clone(),
        })
        .filter(|r| r.relevance >= req.min_relevance)
        .collect();
    results.sort_by(|a, b| b.relevance.total_cmp(&a.relevance).then_with(|| a.memory.id.cmp(&b.memory.id)));
    results.truncate(req.limit as usize);
    Json(QueryResponse { results })
}

async fn get_memory(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Memory>> {
    let mut memories = lock(&state.memories);
    let memory = memories
        .get_mut(&id)
        .ok_or_else(|| PlatformError::NotFound(format!("memory {id} not found")))?;
    memory.access_count += 1;
    memory.last_accessed_at = Some(Utc::now());
    Ok(Json(memory.clone()))
}

async fn delete_memory(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    lock(&state.memories)
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| PlatformError::NotFound(format!("memory {id} not found")))
}

async fn create_edge(State(state): State<AppState>, Json(req): Json<CreateEdgeRequest>) -> ApiResult<Json<Edge>> {
    {
        let memories = lock(&state.memories);
        for id in [&req.source_id, &req.target_id] {
            if !memories.contains_key(id) {
                return Err(PlatformError::NotFound(format!("memory {id} not found")));
            }
        }
    }
    let now = Utc::now();
    let edge = Edge {
        source_id: req.source_id,
        target_id: req.target_id,
        relationship: req.relationship,
        strength: req.strength,
        created_at: Some(now),
        last_strengthened_at: Some(now),
    };
    lock(&state.edges).push(edge.clone());
    Ok(Json(edge))
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PathQuery {
    path: String,
}

#[derive(Deserialize)]
struct ListQuery {
    path: String,
    #[serde(default)]
    recursive: bool,
    pattern: Option<String>,
}

/// `*` matches any run of characters; everything else is literal.
fn glob_match(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == name,
        Some((head, tail)) => {
            let Some(rest) = name.strip_prefix(head) else {
                return false;
            };
            (0..=rest.len())
                .filter(|&i| rest.is_char_boundary(i))
                .any(|i| glob_match(tail, &rest[i..]))
        }
    }
}

fn dir_prefix(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    format!("{trimmed}/")
}

fn file_info(path: &str, size: usize) -> FileInfo {
    FileInfo {
        path: path.to_string(),
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        size: size as u64,
        is_directory: false,
        modified_at: Some(Utc::now()),
        created_at: None,
        permissions: "rw-r--r--".into(),
    }
}

async fn list_files(State(state): State<AppState>, Query(q): Query<ListQuery>) -> Json<DirectoryListing> {
    let prefix = dir_prefix(&q.path);
    let files: Vec<FileInfo> = lock(&state.files)
        .iter()
        .filter_map(|(path, contents)| {
            let rest = path.strip_prefix(&prefix)?;
            if !q.recursive && rest.contains('/') {
                return None;
            }
            let info = file_info(path, contents.len());
            match &q.pattern {
                Some(p) if !glob_match(p, &info.name) => None,
                _ => Some(info),
            }
        })
        .collect();
    Json(DirectoryListing {
        path: q.path,
        total_count: files.len() as u64,
        files,
    })
}

fn file_bytes(state: &PlatformState, path: &str) -> ApiResult<Vec<u8>> {
    lock(&state.files)
        .get(path)
        .cloned()
        .ok_or_else(|| PlatformError::NotFound(format!("file {path} not found")))
}

async fn read_file(State(state): State<AppState>, Query(q): Query<PathQuery>) -> ApiResult<Json<FileContent>> {
    let bytes = file_bytes(&state, &q.path)?;
    Ok(Json(FileContent {
        content: String::from_utf8_lossy(&bytes).into_owned(),
    }))
}

async fn read_file_bytes(State(state): State<AppState>, Query(q): Query<PathQuery>) -> ApiResult<Response> {
    let bytes = file_bytes(&state, &q.path)?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes).into_response())
}

async fn write_file(State(state): State<AppState>, Json(req): Json<WriteFileRequest>) -> ApiResult<Json<FileInfo>> {
    let mut files = lock(&state.files);
    let parent = req.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    if !req.create_dirs && !parent.is_empty() {
        let prefix = dir_prefix(parent);
        if !files.keys().any(|p| p.starts_with(&prefix)) {
            return Err(PlatformError::NotFound(format!("directory {parent} not found")));
        }
    }
    let info = file_info(&req.path, req.content.len());
    files.insert(req.path, req.content.into_bytes());
    Ok(Json(info))
}

async fn delete_file(State(state): State<AppState>, Query(q): Query<PathQuery>) -> ApiResult<StatusCode> {
    lock(&state.files)
        .remove(&q.path)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| PlatformError::NotFound(format!("file {} not found", q.path)))
}

async fn sync(Json(req): Json<SyncRequest>) -> Json<SyncStatus> {
    Json(SyncStatus {
        path: req.path,
        synced: true,
        last_sync_at: Some(Utc::now()),
        pending_changes: 0,
    })
}
