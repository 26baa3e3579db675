//! Client configuration, from code or environment variables.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BRAVOZERO_API_KEY` | (required) | Sent as `X-API-Key` |
//! | `BRAVOZERO_AGENT_ID` | (required) | PERSONA agent id, sent as `X-Agent-ID` |
//! | `BRAVOZERO_PRIVATE_KEY_PATH` | (absent = unsigned requests) | PEM Ed25519 key |
//! | `BRAVOZERO_ENVIRONMENT` | `production` | `production`, `staging` or `development` |
//! | `BRAVOZERO_BASE_URL` | derived from environment | Overrides the API base URL |
//! | `BRAVOZERO_TIMEOUT_SECS` | `30` | Per-request timeout |
//!
//! Values set on the builder always win over the environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::HeaderValue;

use crate::error::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_API_KEY: &str = "BRAVOZERO_API_KEY";
const ENV_AGENT_ID: &str = "BRAVOZERO_AGENT_ID";
const ENV_PRIVATE_KEY_PATH: &str = "BRAVOZERO_PRIVATE_KEY_PATH";
const ENV_ENVIRONMENT: &str = "BRAVOZERO_ENVIRONMENT";
const ENV_BASE_URL: &str = "BRAVOZERO_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "BRAVOZERO_TIMEOUT_SECS";

/// Deployment the client talks to when no explicit base URL is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Development,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://api.bravozero.ai",
            Environment::Staging => "https://api.staging.bravozero.ai",
            Environment::Development => "http://localhost:8080",
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            other => Err(Error::Config(format!(
                "unknown environment {other:?} (expected production, staging or development)"
            ))),
        }
    }
}

/// Immutable settings shared by every sub-client and request.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    agent_id: String,
    base_url: String,
    environment: Environment,
    timeout: Duration,
    private_key_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Populate config entirely from `BRAVOZERO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::builder().with_env_fallback().build()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// API base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn private_key_path(&self) -> Option<&Path> {
        self.private_key_path.as_deref()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("agent_id", &self.agent_id)
            .field("base_url", &self.base_url)
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .field("private_key_path", &self.private_key_path)
            .finish()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    api_key: Option<String>,
    agent_id: Option<String>,
    base_url: Option<String>,
    environment: Option<Environment>,
    timeout: Option<Duration>,
    private_key_path: Option<PathBuf>,
    env_error: Option<String>,
}

impl ClientConfigBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn private_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key_path = Some(path.into());
        self
    }

    /// Fill every field not already set from `BRAVOZERO_*` variables.
    pub fn with_env_fallback(self) -> Self {
        self.with_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = var(ENV_API_KEY);
        }
        if self.agent_id.is_none() {
            self.agent_id = var(ENV_AGENT_ID);
        }
        if self.private_key_path.is_none() {
            self.private_key_path = var(ENV_PRIVATE_KEY_PATH).map(PathBuf::from);
        }
        if self.base_url.is_none() {
            self.base_url = var(ENV_BASE_URL);
        }
        if self.environment.is_none() {
            if let Some(raw) = var(ENV_ENVIRONMENT) {
                match raw.parse() {
                    Ok(env) => self.environment = Some(env),
                    Err(e) => self.env_error = Some(format!("{ENV_ENVIRONMENT}: {e}")),
                }
            }
        }
        if self.timeout.is_none() {
            if let Some(raw) = var(ENV_TIMEOUT_SECS) {
                match raw.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 => self.timeout = Some(Duration::from_secs(secs)),
                    _ => {
                        self.env_error = Some(format!(
                            "{ENV_TIMEOUT_SECS} must be a positive integer, got {raw:?}"
                        ))
                    }
                }
            }
        }
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the API key or agent id is missing or not a
    /// valid header value, the base URL does not parse, the timeout is zero,
    /// or an environment variable held an invalid value.
    pub fn build(self) -> Result<ClientConfig> {
        if let Some(msg) = self.env_error {
            return Err(Error::Config(msg));
        }

        let api_key = required(self.api_key, "API key", ENV_API_KEY)?;
        let agent_id = required(self.agent_id, "agent id", ENV_AGENT_ID)?;

        let environment = self.environment.unwrap_or_default();
        let base_url = self
            .base_url
            .unwrap_or_else(|| environment.base_url().to_string())
            .trim_end_matches('/')
            .to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid base URL {base_url:?}: {e}")))?;

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".into()));
        }

        Ok(ClientConfig {
            api_key,
            agent_id,
            base_url,
            environment,
            timeout,
            private_key_path: self.private_key_path,
        })
    }
}

fn required(value: Option<String>, what: &str, var: &str) -> Result<String> {
    let value = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{what} required: set {var} or pass it to the builder")))?;
    HeaderValue::from_str(&value)
        .map_err(|_| Error::Config(format!("{what} contains characters not allowed in an HTTP header")))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_to_production() {
        let config = ClientConfig::builder()
            .api_key("key")
            .agent_id("agent-1")
            .build()
            .unwrap();
        assert_eq!(config.base_url(), "https://api.bravozero.ai");
        assert_eq!(config.environment(), Environment::Production);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(config.private_key_path().is_none());
    }

    #[test]
    fn environment_selects_base_url() {
        let config = ClientConfig::builder()
            .api_key("key")
            .agent_id("agent-1")
            .environment(Environment::Staging)
            .build()
            .unwrap();
        assert_eq!(config.base_url(), "https://api.staging.bravozero.ai");
    }

    #[test]
    fn explicit_base_url_wins_and_is_trimmed() {
        let config = ClientConfig::builder()
            .api_key("key")
            .agent_id("agent-1")
            .environment(Environment::Development)
            .base_url("http://127.0.0.1:9000/")
            .build()
            .unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let err = ClientConfig::builder().agent_id("agent-1").build().unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("BRAVOZERO_API_KEY")));
        assert!(err.is_fatal());
    }

    #[test]
    fn missing_agent_id_is_config_error() {
        let err = ClientConfig::builder().api_key("key").build().unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("BRAVOZERO_AGENT_ID")));
    }

    #[test]
    fn header_unsafe_api_key_rejected() {
        let err = ClientConfig::builder()
            .api_key("line\nbreak")
            .agent_id("agent-1")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn env_fills_unset_fields() {
        let config = ClientConfig::builder()
            .with_vars(vars(&[
                ("BRAVOZERO_API_KEY", "env-key"),
                ("BRAVOZERO_AGENT_ID", "env-agent"),
                ("BRAVOZERO_PRIVATE_KEY_PATH", "/keys/agent.pem"),
                ("BRAVOZERO_ENVIRONMENT", "Staging"),
                ("BRAVOZERO_TIMEOUT_SECS", "5"),
            ]))
            .build()
            .unwrap();
        assert_eq!(config.api_key(), "env-key");
        assert_eq!(config.agent_id(), "env-agent");
        assert_eq!(config.private_key_path(), Some(Path::new("/keys/agent.pem")));
        assert_eq!(config.environment(), Environment::Staging);
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn builder_values_win_over_env() {
        let config = ClientConfig::builder()
            .api_key("explicit")
            .agent_id("explicit-agent")
            .with_vars(vars(&[
                ("BRAVOZERO_API_KEY", "env-key"),
                ("BRAVOZERO_AGENT_ID", "env-agent"),
            ]))
            .build()
            .unwrap();
        assert_eq!(config.api_key(), "explicit");
        assert_eq!(config.agent_id(), "explicit-agent");
    }

    #[test]
    fn bad_env_values_surface_at_build() {
        let err = ClientConfig::builder()
            .with_vars(vars(&[
                ("BRAVOZERO_API_KEY", "k"),
                ("BRAVOZERO_AGENT_ID", "a"),
                ("BRAVOZERO_TIMEOUT_SECS", "soon"),
            ]))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("BRAVOZERO_TIMEOUT_SECS")));

        let err = ClientConfig::builder()
            .with_vars(vars(&[
                ("BRAVOZERO_API_KEY", "k"),
                ("BRAVOZERO_AGENT_ID", "a"),
                ("BRAVOZERO_ENVIRONMENT", "moon"),
            ]))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("moon")));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ClientConfig::builder()
            .api_key("super-secret")
            .agent_id("agent-1")
            .build()
            .unwrap();
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
