//! Plumbing shared by the typed sub-clients: URL building, JSON decoding,
//! cancellation and status refinement.

use std::sync::Arc;

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::executor::Executor;

/// One API prefix (e.g. `/v1/memory`) bound to a shared [`Executor`].
#[derive(Clone)]
pub(crate) struct Service {
    executor: Arc<Executor>,
    base: String,
    cancel: CancellationToken,
}

impl Service {
    pub(crate) fn new(executor: Arc<Executor>, prefix: &str) -> Self {
        let base = format!("{}{prefix}", executor.config().base_url());
        Self {
            executor,
            base,
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub(crate) fn agent_id(&self) -> &str {
        self.executor.config().agent_id()
    }

    pub(crate) async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.send_with_accept(method, path, body, None).await
    }

    pub(crate) async fn send_with_accept<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        accept: Option<&str>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.base);
        self.executor
            .execute_with_accept(method, &url, body, accept, &self.cancel)
            .await
            .map_err(Error::refine_auth)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        self.decode(response).await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, Some(body)).await?;
        self.decode(response).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        self.decode(response).await
    }

    /// `DELETE`, discarding whatever body the server sends back.
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    /// Read the whole body, honouring cancellation.
    pub(crate) async fn bytes(&self, response: Response) -> Result<Vec<u8>> {
        let bytes = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            read = response.bytes() => read?,
        };
        Ok(bytes.to_vec())
    }

    pub(crate) async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let url = response.url().clone();
        let bytes = self.bytes(response).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            debug!(%url, "response did not match expected shape: {e}");
            Error::Decode(e)
        })
    }
}

/// `?k=v&k2=v2` with values percent-encoded, or `""` when there are no pairs.
pub(crate) fn query_string(pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let joined: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect();
    format!("?{}", joined.join("&"))
}

/// A single path segment, percent-encoded.
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_encodes_values() {
        assert_eq!(query_string(&[]), "");
        assert_eq!(
            query_string(&[("path", "/src/a b.rs"), ("pattern", "*.rs")]),
            "?path=%2Fsrc%2Fa%20b.rs&pattern=%2A.rs"
        );
    }

    #[test]
    fn segment_escapes_slashes() {
        assert_eq!(segment("rules/../admin"), "rules%2F..%2Fadmin");
    }
}
