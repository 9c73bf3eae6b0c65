//! Forwarder configuration.
//!
//! The forwarder never reads process state on its own. Callers build a
//! [`ForwarderConfig`] up front, either directly or through
//! [`ForwarderConfig::from_lookup`], and inject it at construction time.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ForwardError;

/// Environment variable holding the agent service URL.
pub const AGENT_URL_ENV: &str = "CSA_AGENT_URL";

/// Environment variable overriding the request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "CSA_TIMEOUT_SECS";

/// Default request timeout for calls to the agent service.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// A validated destination: where to POST and which audience to mint tokens for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination<'a> {
    /// Parsed URL the request is sent to.
    pub url: Url,
    /// The URL exactly as configured. Tokens are bound to this value.
    pub audience: &'a str,
}

/// Settings for an [`AuthenticatedForwarder`](crate::AuthenticatedForwarder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwarderConfig {
    /// Full URL of the agent service. Also used as the token audience.
    pub agent_url: Option<String>,
    /// Upper bound for the whole request, connect through body.
    pub timeout: Duration,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            agent_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ForwarderConfig {
    /// Creates a configuration with no destination and the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the agent service URL.
    #[must_use]
    pub fn with_agent_url(mut self, agent_url: impl Into<String>) -> Self {
        self.agent_url = Some(agent_url.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds a configuration from a key lookup, usually the process environment.
    ///
    /// Blank values count as unset. An unparsable or zero timeout falls back
    /// to [`DEFAULT_TIMEOUT`] with a warning.
    ///
    /// ```
    /// use csa_forwarder::ForwarderConfig;
    ///
    /// let config = ForwarderConfig::from_lookup(|key| std::env::var(key).ok());
    /// # let _ = config;
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let agent_url = lookup(AGENT_URL_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let timeout = match lookup(TIMEOUT_ENV) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    log::warn!(
                        "Ignoring invalid {TIMEOUT_ENV} value '{raw}', using {}s",
                        DEFAULT_TIMEOUT.as_secs()
                    );
                    DEFAULT_TIMEOUT
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        Self { agent_url, timeout }
    }

    /// Resolves the destination URL.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError::Configuration`] if the URL is unset, does not
    /// parse, or is not an `http`/`https` URL.
    pub fn destination(&self) -> Result<Destination<'_>, ForwardError> {
        let raw = self.agent_url.as_deref().ok_or_else(|| {
            ForwardError::Configuration(format!("{AGENT_URL_ENV} environment variable is not set"))
        })?;

        let url = Url::parse(raw)
            .map_err(|e| ForwardError::Configuration(format!("Invalid agent URL '{raw}': {e}")))?;

        match url.scheme() {
            "https" | "http" => Ok(Destination { url, audience: raw }),
            other => Err(ForwardError::Configuration(format!(
                "Unsupported agent URL scheme '{other}' in '{raw}'"
            ))),
        }
    }
}
