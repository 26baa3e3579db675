//! Memory Service: record, recall and link an agent's memories.

use std::sync::Arc;

use bravozero_api::memory::DEFAULT_EDGE_STRENGTH;
use bravozero_api::{CreateEdgeRequest, Edge, Memory, MemoryQueryResult, QueryRequest, QueryResponse, RecordRequest};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::executor::Executor;
use crate::service::{segment, Service};

const PREFIX: &str = "/v1/memory";

/// Client for `/v1/memory`.
#[derive(Clone)]
pub struct MemoryClient {
    service: Service,
}

impl MemoryClient {
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

    /// Store a memory. Importance defaults to 0.5 and the namespace to this
    /// agent's id.
    pub async fn record(&self, mut request: RecordRequest) -> Result<Memory> {
        request.apply_defaults(self.service.agent_id());
        self.service.post("/record", &request).await
    }

    /// Semantic search. Limit defaults to 10 and minimum relevance to 0.5.
    pub async fn query(&self, mut request: QueryRequest) -> Result<Vec<MemoryQueryResult>> {
        request.apply_defaults();
        let response: QueryResponse = self.service.post("/query", &request).await?;
        Ok(response.results)
    }

    /// Fetch one memory; a 404 becomes [`Error::NotFound`](crate::Error::NotFound).
    pub async fn get(&self, id: &str) -> Result<Memory> {
        self.service
            .get(&format!("/{}", segment(id)))
            .await
            .map_err(|e| e.refine_not_found("memory", id))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.service
            .delete(&format!("/{}", segment(id)))
            .await
            .map_err(|e| e.refine_not_found("memory", id))
    }

    /// Link two memories. A `strength` of zero means the default, 0.5.
    pub async fn create_edge(
        &self,
        source_id: &str,
        target_id: &str,
        relationship: &str,
        strength: f64,
    ) -> Result<Edge> {
        let request = CreateEdgeRequest {
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            relationship: relationship.to_string(),
            strength: if strength == 0.0 { DEFAULT_EDGE_STRENGTH } else { strength },
        };
        self.service.post("/edges", &request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use bravozero_api::MemoryType;
    use serde_json::{json, Value};

    use super::*;
    use crate::error::Error;
    use crate::test_support::{spawn_mock_server, test_authenticator, test_config};

    async fn client_for(router: Router) -> MemoryClient {
        let base = spawn_mock_server(router).await;
        let executor = Executor::new(
            Arc::new(test_config(&base)),
            Some(Arc::new(test_authenticator())),
        )
        .unwrap();
        MemoryClient::new(Arc::new(executor))
    }

    /// Route that stores the posted body in `sink` and answers with `reply`.
    fn capture(path: &str, sink: Arc<Mutex<Option<Value>>>, reply: Value) -> Router {
        Router::new().route(
            path,
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                let reply = reply.clone();
                async move {
                    *sink.lock().unwrap() = Some(body);
                    Json(reply)
                }
            }),
        )
    }

    #[tokio::test]
    async fn record_fills_defaults() {
        let seen = Arc::new(Mutex::new(None));
        let router = capture(
            "/v1/memory/record",
            seen.clone(),
            json!({"id": "m-1", "content": "the sky is blue", "memoryType": "semantic"}),
        );
        let client = client_for(router).await;

        let memory = client.record(RecordRequest::new("the sky is blue")).await.unwrap();
        assert_eq!(memory.id, "m-1");
        assert_eq!(memory.memory_type, MemoryType::Semantic);

        let body = seen.lock().unwrap().take().unwrap();
        assert_eq!(body["importance"], 0.5);
        assert_eq!(body["namespace"], "agent-test");
        assert_eq!(body["memoryType"], "semantic");
    }

    #[tokio::test]
    async fn query_unwraps_results() {
        let seen = Arc::new(Mutex::new(None));
        let router = capture(
            "/v1/memory/query",
            seen.clone(),
            json!({"results": [
                {"memory": {"id": "m-1", "content": "a"}, "relevance": 0.9},
                {"memory": {"id": "m-2", "content": "b"}, "relevance": 0.6},
            ]}),
        );
        let client = client_for(router).await;

        let results = client.query(QueryRequest::new("sky")).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].memory.id, "m-1");

        let body = seen.lock().unwrap().take().unwrap();
        assert_eq!(body["limit"], 10);
        assert_eq!(body["minRelevance"], 0.5);
        assert!(body.get("tags").is_none());
    }

    #[tokio::test]
    async fn edge_strength_defaults_when_zero() {
        let seen = Arc::new(Mutex::new(None));
        let router = capture(
            "/v1/memory/edges",
            seen.clone(),
            json!({"sourceId": "m-1", "targetId": "m-2", "relationship": "supports", "strength": 0.5}),
        );
        let client = client_for(router).await;

        let edge = client.create_edge("m-1", "m-2", "supports", 0.0).await.unwrap();
        assert_eq!(edge.relationship, "supports");
        assert_eq!(seen.lock().unwrap().take().unwrap()["strength"], 0.5);

        client.create_edge("m-1", "m-2", "supports", 0.8).await.unwrap();
        assert_eq!(seen.lock().unwrap().take().unwrap()["strength"], 0.8);
    }

    #[tokio::test]
    async fn get_and_delete_map_404_to_not_found() {
        let router = Router::new().route(
            "/v1/memory/{id}",
            get(|Path(id): Path<String>| async move {
                if id == "m-1" {
                    (StatusCode::OK, Json(json!({"id": "m-1", "content": "kept"})))
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({"error": "memory not found"})))
                }
            })
            .delete(|Path(id): Path<String>| async move {
                if id == "m-1" {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::NOT_FOUND
                }
            }),
        );
        let client = client_for(router).await;

        assert_eq!(client.get("m-1").await.unwrap().content, "kept");
        let err = client.get("m-9").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { resource: "memory", ref id } if id == "m-9"));

        client.delete("m-1").await.unwrap();
        let err = client.delete("m-9").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { resource: "memory", .. }));
    }

    #[tokio::test]
    async fn server_errors_are_not_refined() {
        let router = Router::new().route(
            "/v1/memory/{id}",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "store offline") }),
        );
        let client = client_for(router).await;
        let err = client.get("m-1").await.unwrap_err();
        assert!(matches!(err, Error::Http { status: 500, ref body } if body == "store offline"));
        assert!(err.is_retryable());
    }
}
