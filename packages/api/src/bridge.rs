//! Forge Bridge types: `/v1/bridge/*`, the agent's virtual filesystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one VFS entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default, with = "crate::time")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::time")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub permissions: String,
}

/// Response body for `GET /v1/bridge/files`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    pub path: String,
    #[serde(default)]
    pub files: Vec<FileInfo>,
    #[serde(default)]
    pub total_count: u64,
}

/// Response body for `GET /v1/bridge/file`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileContent {
    pub content: String,
}

/// Request body for `PUT /v1/bridge/file`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WriteFileRequest {
    pub path: String,
    pub content: String,
    pub create_dirs: bool,
}

/// Request body for `POST /v1/bridge/sync`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncRequest {
    pub path: String,
}

/// Response body for `POST /v1/bridge/sync`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub path: String,
    #[serde(default)]
    pub synced: bool,
    #[serde(default, with = "crate::time")]
    pub last_sync_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pending_changes: u64,
}
