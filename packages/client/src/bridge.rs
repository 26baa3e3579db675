//! Forge Bridge: the agent's virtual filesystem.

use std::sync::Arc;

use bravozero_api::{DirectoryListing, FileContent, FileInfo, SyncRequest, SyncStatus, WriteFileRequest};
use reqwest::Method;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::executor::Executor;
use crate::service::{query_string, Service};

const PREFIX: &str = "/v1/bridge";
const OCTET_STREAM: &str = "application/octet-stream";

/// Client for `/v1/bridge`.
#[derive(Clone)]
pub struct BridgeClient {
    service: Service,
}

impl BridgeClient {
    pub(crate) fn new(executor: Arc<Executor>) -> Self {
        Self {
            service: Service::new(executor, PREFIX),
        }
    }

    /// Bind every subsequent call to `token`.
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        Self {
            service: self.service.with_cancellation(token),
        }
    }

    /// List `path`. `recursive` and `pattern` are only sent when set.
    pub async fn list_files(
        &self,
        path: &str,
        recursive: bool,
        pattern: Option<&str>,
    ) -> Result<DirectoryListing> {
        let mut pairs = vec![("path", path)];
        if recursive {
            pairs.push(("recursive", "true"));
        }
        if let Some(pattern) = pattern.filter(|p| !p.is_empty()) {
            pairs.push(("pattern", pattern));
        }
        self.service.get(&format!("/files{}", query_string(&pairs))).await
    }

    /// File contents as text.
    pub async fn read_file(&self, path: &str) -> Result<String> {
        let content: FileContent = self
            .service
            .get(&format!("/file{}", query_string(&[("path", path)])))
            .await
            .map_err(|e| e.refine_not_found("file", path))?;
        Ok(content.content)
    }

    /// File contents as raw bytes.
    pub async fn read_file_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .service
            .send_with_accept(
                Method::GET,
                &format!("/file/bytes{}", query_string(&[("path", path)])),
                None::<&()>,
                Some(OCTET_STREAM),
            )
            .await
            .map_err(|e| e.refine_not_found("file", path))?;
        self.service.bytes(response).await
    }

    pub async fn write_file(&self, path: &str, content: &str, create_dirs: bool) -> Result<FileInfo> {
        let request = WriteFileRequest {
            path: path.to_string(),
            content: content.to_string(),
            create_dirs,
        };
        self.service.put("/file", &request).await
    }

    pub async fn delete_file(&self, path: &str) -> Result<()> {
        self.service
            .delete(&format!("/file{}", query_string(&[("path", path)])))
            .await
            .map_err(|e| e.refine_not_found("file", path))
    }

    /// Trigger synchronization of `path`, or of the whole VFS when empty.
    pub async fn sync(&self, path: &str) -> Result<SyncStatus> {
        let path = if path.is_empty() { "/" } else { path };
        let request = SyncRequest {
            path: path.to_string(),
        };
        self.service.post("/sync", &request).await
    }
}
