//! Constitution Agent: governance evaluation, the Ω score and the rule book.

use std::sync::Arc;

use bravozero_api::{Decision, EvaluateRequest, EvaluationResult, OmegaScore, Rule, RuleFilter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::service::{query_string, segment, Service};

const PREFIX: &str = "/v1/constitution";

/// Client for `/v1/constitution`.
#[derive(Clone)]
pub struct ConstitutionClient {
    service: Service,
}

impl ConstitutionClient {
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

    /// Ask the Constitution Agent whether this agent may perform `request.action`.
    ///
    /// `permit` and `escalate` come back as `Ok`. A `deny` is an error,
    /// [`Error::Denied`], carrying the agent's reasoning and the full result;
    /// use [`Error::into_denied_result`] to treat it as data.
    pub async fn evaluate(&self, request: EvaluateRequest) -> Result<EvaluationResult> {
        let body = request.into_body(self.service.agent_id());
        let action = body.action.clone();
        let result: EvaluationResult = self.service.post("/evaluate", &body).await?;

        match result.decision {
            Decision::Deny => {
                info!(%action, request_id = %result.request_id, "action denied: {}", result.reasoning);
                Err(Error::Denied {
                    reasoning: result.reasoning.clone(),
                    result: Box::new(result),
                })
            }
            decision => {
                debug!(%action, %decision, request_id = %result.request_id, "action evaluated");
                Ok(result)
            }
        }
    }

    /// Current system-wide Ω score.
    pub async fn omega(&self) -> Result<OmegaScore> {
        self.service.get("/omega").await
    }

    pub async fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<Rule>> {
        let path = format!("/rules{}", query_string(&filter.query_pairs()));
        self.service.get(&path).await
    }

    /// Fetch one rule; a 404 becomes [`Error::NotFound`].
    pub async fn get_rule(&self, id: &str) -> Result<Rule> {
        self.service
            .get(&format!("/rules/{}", segment(id)))
            .await
            .map_err(|e| e.refine_not_found("rule", id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::extract::{Path, RawQuery};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::test_support::{spawn_mock_server, test_authenticator, test_config};

    async fn client_for(router: Router) -> ConstitutionClient {
        let base = spawn_mock_server(router).await;
        let executor = Executor::new(
            Arc::new(test_config(&base)),
            Some(Arc::new(test_authenticator())),
        )
        .unwrap();
        ConstitutionClient::new(Arc::new(executor))
    }

    fn evaluator(decision: &'static str, reasoning: &'static str) -> Router {
        Router::new().route(
            "/v1/constitution/evaluate",
            post(move |Json(body): Json<Value>| async move {
                Json(json!({
                    "requestId": "req-1",
                    "decision": decision,
                    "confidence": 0.9,
                    "alignmentScore": 0.8,
                    "reasoning": reasoning,
                    "echo": body,
                }))
            }),
        )
    }

    #[tokio::test]
    async fn permit_is_returned() {
        let client = client_for(evaluator("permit", "fine")).await;
        let result = client.evaluate(EvaluateRequest::new("read_file")).await.unwrap();
        assert_eq!(result.decision, Decision::Permit);
        assert_eq!(result.request_id, "req-1");
    }

    #[tokio::test]
    async fn escalate_is_returned_not_raised() {
        let client = client_for(evaluator("escalate", "needs a human")).await;
        let result = client.evaluate(EvaluateRequest::new("deploy")).await.unwrap();
        assert_eq!(result.decision, Decision::Escalate);
    }

    #[tokio::test]
    async fn deny_is_raised_with_reasoning() {
        let client = client_for(evaluator("deny", "policy X")).await;
        let err = client
            .evaluate(EvaluateRequest::new("delete_production"))
            .await
            .unwrap_err();
        match err {
            Error::Denied { reasoning, result } => {
                assert_eq!(reasoning, "policy X");
                assert_eq!(result.decision, Decision::Deny);
            }
            other => panic!("expected Denied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn evaluate_sends_agent_and_default_priority() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let router = Router::new().route(
            "/v1/constitution/evaluate",
            post(move |Json(body): Json<Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some(body);
                    Json(json!({"decision": "permit"}))
                }
            }),
        );
        let client = client_for(router).await;
        client
            .evaluate(EvaluateRequest::new("write_file").with_context("path", "/tmp/x"))
            .await
            .unwrap();

        let body = seen.lock().unwrap().take().unwrap();
        assert_eq!(body["agentId"], "agent-test");
        assert_eq!(body["action"], "write_file");
        assert_eq!(body["priority"], "normal");
        assert_eq!(body["context"]["path"], "/tmp/x");
    }

    #[tokio::test]
    async fn malformed_result_is_a_decode_error() {
        let router = Router::new().route(
            "/v1/constitution/evaluate",
            post(|| async { Json(json!({"decision": "maybe"})) }),
        );
        let client = client_for(router).await;
        let err = client.evaluate(EvaluateRequest::new("x")).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "{err:?}");
    }

    #[tokio::test]
    async fn list_rules_forwards_filters() {
        let router = Router::new().route(
            "/v1/constitution/rules",
            get(|RawQuery(query): RawQuery| async move {
                Json(json!([{
                    "id": "r-1",
                    "name": query.unwrap_or_default(),
                    "category": "safety",
                    "active": true,
                }]))
            }),
        );
        let client = client_for(router).await;

        let filter = RuleFilter {
            category: Some("safety".into()),
            priority: None,
        };
        let rules = client.list_rules(&filter).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "category=safety");

        let all = client.list_rules(&RuleFilter::default()).await.unwrap();
        assert_eq!(all[0].name, "");
    }

    #[tokio::test]
    async fn missing_rule_is_not_found() {
        let router = Router::new().route(
            "/v1/constitution/rules/{id}",
            get(|Path(id): Path<String>| async move {
                if id == "r-1" {
                    (StatusCode::OK, Json(json!({"id": "r-1", "name": "no deletes"})))
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({"error": "rule not found"})))
                }
            }),
        );
        let client = client_for(router).await;

        assert_eq!(client.get_rule("r-1").await.unwrap().name, "no deletes");
        let err = client.get_rule("r-404").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { resource: "rule", ref id } if id == "r-404"));
    }

    #[tokio::test]
    async fn rejected_credentials_surface_as_authentication_failure() {
        let router = Router::new().route(
            "/v1/constitution/omega",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "invalid attestation", "code": "invalid_attestation"})),
                )
            }),
        );
        let client = client_for(router).await;
        let err = client.omega().await.unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed { ref message } if message == "invalid attestation"));
    }

    #[tokio::test]
    async fn cancelled_client_sends_nothing() {
        let client = client_for(evaluator("permit", "fine")).await;
        let token = CancellationToken::new();
        token.cancel();
        let err = client
            .with_cancellation(token)
            .evaluate(EvaluateRequest::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
