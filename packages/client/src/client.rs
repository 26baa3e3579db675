//! The top-level [`Client`]: one configuration, one authenticator, one
//! connection pool, shared by every sub-client.

use std::sync::Arc;

use bravozero_auth::Authenticator;
use tracing::{debug, info};

use crate::bridge::BridgeClient;
use crate::config::ClientConfig;
use crate::constitution::ConstitutionClient;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::memory::MemoryClient;

/// Entry point to the Bravo Zero platform.
///
/// Cheap to clone; clones share the HTTP connection pool and the
/// authenticator, so nonces stay unique across all of them.
///
/// ```no_run
/// # async fn run() -> bravozero::Result<()> {
/// use bravozero::{Client, EvaluateRequest};
///
/// let client = Client::from_env()?;
/// let result = client
///     .constitution()
///     .evaluate(EvaluateRequest::new("read_file").with_context("path", "/etc/hosts"))
///     .await?;
/// println!("{} ({})", result.decision, result.reasoning);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    executor: Arc<Executor>,
}

impl Client {
    /// Build a client, loading the signing key from
    /// [`ClientConfig::private_key_path`] when one is set.
    ///
    /// # Errors
    ///
    /// [`Error::KeyParse`] if the key file cannot be read or parsed.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let authenticator = match config.private_key_path() {
            Some(path) => {
                let auth = Authenticator::from_pem_file(config.agent_id(), path)?;
                info!(agent_id = %auth.agent_id(), key = %path.display(), "loaded PERSONA signing key");
                Some(auth)
            }
            None => {
                debug!("no private key configured; requests will be unsigned");
                None
            }
        };
        Self::build(config, authenticator)
    }

    /// Build a client around an already constructed authenticator.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the authenticator signs for a different agent
    /// than `config.agent_id()`.
    pub fn with_authenticator(config: ClientConfig, authenticator: Option<Authenticator>) -> Result<Self> {
        if let Some(auth) = &authenticator {
            if auth.agent_id() != config.agent_id() {
                return Err(Error::Config(format!(
                    "authenticator signs for agent {:?} but the client is configured for {:?}",
                    auth.agent_id(),
                    config.agent_id()
                )));
            }
        }
        Self::build(config, authenticator)
    }

    /// [`Client::new`] with [`ClientConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    fn build(config: ClientConfig, authenticator: Option<Authenticator>) -> Result<Self> {
        let executor = Executor::new(Arc::new(config), authenticator.map(Arc::new))?;
        Ok(Self {
            executor: Arc::new(executor),
        })
    }

    pub fn constitution(&self) -> ConstitutionClient {
        ConstitutionClient::new(self.executor.clone())
    }

    pub fn memory(&self) -> MemoryClient {
        MemoryClient::new(self.executor.clone())
    }

    pub fn bridge(&self) -> BridgeClient {
        BridgeClient::new(self.executor.clone())
    }

    pub fn config(&self) -> &ClientConfig {
        self.executor.config()
    }

    /// The signing authenticator, or `None` when requests go out unsigned.
    pub fn authenticator(&self) -> Option<&Authenticator> {
        self.executor.authenticator()
    }

    /// The shared request executor, for endpoints without a typed wrapper.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", self.config())
            .field("signed", &self.authenticator().is_some())
            .finish()
    }
}
