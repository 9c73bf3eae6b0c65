//! Wrapper configuration.
//!
//! Settings come from an optional TOML file, overridden by environment
//! variables and command-line flags. The file is read from `--config` or,
//! when present, `~/.config/csa-wrapper/config.toml`.
//!
//! ## Example Configuration
//!
//! ```toml
//! agent_url = "https://csa-agent-abc123-uc.a.run.app"
//! timeout_secs = 300
//!
//! [credentials]
//! source = "metadata"
//! metadata_host = "metadata.google.internal"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use csa_forwarder::credentials::METADATA_HOST_ENV;
use csa_forwarder::{
    AuthenticatedForwarder, ForwarderConfig, IdentityTokenProvider, MetadataServerProvider,
    StaticTokenProvider,
};

use crate::error::{Result, WrapperError};

/// Environment variable holding a pre-minted identity token.
pub const IDENTITY_TOKEN_ENV: &str = "CSA_IDENTITY_TOKEN";

/// Where identity tokens come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// The GCE/Cloud Run metadata server.
    #[default]
    Metadata,
    /// A fixed token from `CSA_IDENTITY_TOKEN`.
    Static,
}

/// Wrapper configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperConfig {
    /// URL of the CSA agent service.
    #[serde(default)]
    pub agent_url: Option<String>,

    /// Request timeout in seconds (default: 300)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Identity token settings
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Identity token settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub source: CredentialSource,

    /// Metadata server host; `GCE_METADATA_HOST` takes precedence.
    #[serde(default)]
    pub metadata_host: Option<String>,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            agent_url: None,
            timeout_secs: default_timeout_secs(),
            credentials: CredentialsConfig::default(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    300
}

/// Values from the command line and environment that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub agent_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub credentials: Option<CredentialSource>,
}

impl WrapperConfig {
    /// Loads configuration from `path`, or from the default location if it exists.
    ///
    /// An explicit path must exist. Without one, a missing default file
    /// yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialized.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(WrapperError::Config(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => match Self::config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents = fs::read_to_string(&path).map_err(|e| {
            WrapperError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization or validation fails.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the default configuration file path, if a config directory exists.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("csa-wrapper").join("config.toml"))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `timeout_secs` is zero or `agent_url` is blank.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(WrapperError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.agent_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(WrapperError::Config(
                "agent_url must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Applies command-line and environment overrides.
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(agent_url) = overrides.agent_url.filter(|u| !u.trim().is_empty()) {
            self.agent_url = Some(agent_url);
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(source) = overrides.credentials {
            self.credentials.source = source;
        }
    }

    /// The forwarder settings described by this configuration.
    #[must_use]
    pub fn forwarder_config(&self) -> ForwarderConfig {
        let config = ForwarderConfig::new().with_timeout(Duration::from_secs(self.timeout_secs));
        match &self.agent_url {
            Some(url) => config.with_agent_url(url.trim()),
            None => config,
        }
    }

    /// Builds the configured identity token provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's HTTP client cannot be built.
    pub fn token_provider<F>(&self, lookup: F) -> Result<Arc<dyn IdentityTokenProvider>>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self.credentials.source {
            CredentialSource::Metadata => {
                let file_host = self.credentials.metadata_host.clone();
                let provider = MetadataServerProvider::from_lookup(|key| {
                    lookup(key).or_else(|| {
                        (key == METADATA_HOST_ENV)
                            .then(|| file_host.clone())
                            .flatten()
                    })
                })?;
                Ok(Arc::new(provider))
            }
            CredentialSource::Static => {
                let token = lookup(IDENTITY_TOKEN_ENV).map(SecretString::from);
                if token.is_none() {
                    tracing::warn!(
                        "Static credentials selected but {IDENTITY_TOKEN_ENV} is not set"
                    );
                }
                Ok(Arc::new(StaticTokenProvider::new(token)))
            }
        }
    }

    /// Builds a forwarder from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the token provider or HTTP client cannot be built.
    pub fn build_forwarder<F>(&self, lookup: F) -> Result<AuthenticatedForwarder>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = self.token_provider(lookup)?;
        Ok(AuthenticatedForwarder::new(
            self.forwarder_config(),
            provider,
        )?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::io::Write;

    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn sample_config_toml() -> &'static str {
        r#"
agent_url = "https://csa-agent-abc123-uc.a.run.app"
timeout_secs = 120

[credentials]
source = "static"
metadata_host = "169.254.169.254"
        "#
    }

    #[test]
    fn test_parse_config() {
        let config = WrapperConfig::from_toml_str(sample_config_toml()).unwrap();

        assert_eq!(
            config.agent_url.as_deref(),
            Some("https://csa-agent-abc123-uc.a.run.app")
        );
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.credentials.source, CredentialSource::Static);
        assert_eq!(
            config.credentials.metadata_host.as_deref(),
            Some("169.254.169.254")
        );
    }

    #[test]
    fn test_default_settings() {
        let config = WrapperConfig::from_toml_str("").unwrap();

        assert!(config.agent_url.is_none());
        assert_eq!(config.timeout_secs, 300);
        assert_eq!(config.credentials.source, CredentialSource::Metadata);
        assert_eq!(config.forwarder_config().timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_validate_zero_timeout() {
        assert!(WrapperConfig::from_toml_str("timeout_secs = 0").is_err());
    }

    #[test]
    fn test_unknown_credential_source() {
        let err = WrapperConfig::from_toml_str("[credentials]\nsource = \"keyfile\"").unwrap_err();
        assert!(matches!(err, WrapperError::Toml(_)));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = WrapperConfig::from_toml_str(sample_config_toml()).unwrap();
        config.apply_overrides(Overrides {
            agent_url: Some("https://override.a.run.app".to_string()),
            timeout_secs: Some(30),
            credentials: Some(CredentialSource::Metadata),
        });

        assert_eq!(
            config.agent_url.as_deref(),
            Some("https://override.a.run.app")
        );
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.credentials.source, CredentialSource::Metadata);
    }

    #[test]
    fn test_empty_overrides_keep_file_values() {
        let mut config = WrapperConfig::from_toml_str(sample_config_toml()).unwrap();
        let before = config.clone();
        config.apply_overrides(Overrides::default());
        assert_eq!(config, before);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_config_toml().as_bytes()).unwrap();

        let config = WrapperConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = WrapperConfig::load(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_build_forwarder_with_static_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer minted-locally"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"final_response": "pong"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut config = WrapperConfig::default();
        config.apply_overrides(Overrides {
            agent_url: Some(mock_server.uri()),
            timeout_secs: None,
            credentials: Some(CredentialSource::Static),
        });

        let forwarder = config
            .build_forwarder(|key| (key == IDENTITY_TOKEN_ENV).then(|| "minted-locally".to_string()))
            .unwrap();

        assert_eq!(forwarder.relay("ping", "thread-1").await, "pong");
    }

    #[tokio::test]
    async fn test_metadata_host_from_file() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("Metadata-Flavor", "Google"))
            .respond_with(ResponseTemplate::new(200).set_body_string("file-host-token"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let host = mock_server.uri().trim_start_matches("http://").to_string();
        let config = WrapperConfig::from_toml_str(&format!(
            "[credentials]\nsource = \"metadata\"\nmetadata_host = \"{host}\""
        ))
        .unwrap();

        let provider = config.token_provider(|_| None).unwrap();
        let token = provider.fetch_token("https://agent.run.app").await.unwrap();
        assert_eq!(token.bearer(), "Bearer file-host-token");
    }
}
