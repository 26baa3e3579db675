//! The shared request pipeline behind every sub-client.
//!
//! [`Executor::execute`] performs exactly one HTTP round trip:
//!
//! 1. Encodes the optional body as JSON (failure: [`Error::Serialization`],
//!    nothing is sent).
//! 2. Attaches `Content-Type`, `X-API-Key`, `X-Agent-ID` and `User-Agent`.
//! 3. If an [`Authenticator`] is configured, creates a fresh attestation and
//!    attaches it as `X-Persona-Attestation`. If that fails the request is
//!    aborted; it is never sent unsigned.
//! 4. Sends the request with the configured timeout.
//! 5. Classifies the response: 429 is [`Error::RateLimited`], any other
//!    status ≥ 400 is [`Error::Http`] with the body text, everything else is
//!    handed back still unread.
//!
//! There is no retry logic here. Retry policy belongs to the caller, who
//! knows whether the endpoint is idempotent.

use std::sync::Arc;

use bravozero_auth::Authenticator;
use reqwest::header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER, USER_AGENT};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// `User-Agent` sent with every request.
pub const USER_AGENT_VALUE: &str = concat!("bravozero-rust/", env!("CARGO_PKG_VERSION"));

/// Fixed back-off reported for a 429. The server's `Retry-After` header is
/// not consulted.
pub const RATE_LIMIT_RETRY_AFTER_SECS: u64 = 60;

/// Header names used by the platform.
pub mod headers {
    pub const API_KEY: &str = "X-API-Key";
    pub const AGENT_ID: &str = "X-Agent-ID";
    pub const ATTESTATION: &str = "X-Persona-Attestation";
}

/// Issues authenticated requests against the platform.
///
/// Holds a pooled [`reqwest::Client`]; share one executor (via [`Arc`])
/// between all sub-clients.
pub struct Executor {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    authenticator: Option<Arc<Authenticator>>,
}

impl Executor {
    /// Build an executor. Requests are unsigned when `authenticator` is `None`.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the HTTP client cannot be constructed.
    pub fn new(
        config: Arc<ClientConfig>,
        authenticator: Option<Arc<Authenticator>>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            authenticator,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn authenticator(&self) -> Option<&Authenticator> {
        self.authenticator.as_deref()
    }

    /// Perform one request against `url` and classify the outcome.
    ///
    /// On success the response body is left unread for the caller to decode.
    /// If `cancel` fires before the attestation is created nothing is signed
    /// or sent; if it fires while the request is in flight the request is
    /// dropped. Either way the result is [`Error::Cancelled`].
    pub async fn execute<B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.execute_with_accept(method, url, body, None, cancel).await
    }

    /// Like [`execute`](Self::execute), with an explicit `Accept` header.
    pub async fn execute_with_accept<B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        accept: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(Error::Serialization)?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json")
            .header(headers::API_KEY, self.config.api_key())
            .header(headers::AGENT_ID, self.config.agent_id())
            .header(USER_AGENT, USER_AGENT_VALUE);

        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        if let Some(auth) = &self.authenticator {
            let attestation = auth.create_attestation("")?;
            request = request.header(headers::ATTESTATION, attestation);
        }

        if let Some(bytes) = body {
            request = request.body(bytes);
        }

        debug!(
            %method,
            url,
            attested = self.authenticator.is_some(),
            "sending request"
        );

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            sent = request.send() => sent?,
        };

        classify(response, cancel).await
    }
}

async fn classify(response: Response, cancel: &CancellationToken) -> Result<Response> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let server_hint = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        warn!(
            url = %response.url(),
            ?server_hint,
            "rate limited; reporting fixed retry-after of {RATE_LIMIT_RETRY_AFTER_SECS}s"
        );
        return Err(Error::RateLimited {
            retry_after_secs: RATE_LIMIT_RETRY_AFTER_SECS,
        });
    }

    if status.as_u16() >= 400 {
        let url = response.url().clone();
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            text = response.text() => text.unwrap_or_else(|e| {
                debug!(%url, "failed to read error body: {e}");
                String::new()
            }),
        };
        if status.as_u16() >= 500 {
            warn!(%url, status = status.as_u16(), "server error");
        } else {
            debug!(%url, status = status.as_u16(), "client error");
        }
        return Err(Error::Http {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}
