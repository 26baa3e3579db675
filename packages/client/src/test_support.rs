//! Shared fixtures for the crate's unit tests.

use axum::Router;
use bravozero_auth::Authenticator;
use tokio::net::TcpListener;

use crate::config::ClientConfig;

/// Spawn a loopback axum server and return its base URL (`http://127.0.0.1:PORT`).
pub(crate) async fn spawn_mock_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub(crate) fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig::builder()
        .api_key("test-api-key")
        .agent_id("agent-test")
        .base_url(base_url)
        .build()
        .unwrap()
}

pub(crate) fn test_authenticator() -> Authenticator {
    Authenticator::from_seed("agent-test", &[0x42; 32])
}
