//! Identity tokens from the GCE/Cloud Run metadata server.
//!
//! Inside Google Cloud the metadata server mints OIDC identity tokens for
//! the attached service account, bound to whatever audience is asked for.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};

use super::{IdentityToken, IdentityTokenProvider};
use crate::error::CredentialError;

/// Environment variable overriding the metadata server host.
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
const IDENTITY_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/identity";
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches audience-bound identity tokens from the metadata server.
#[derive(Debug, Clone)]
pub struct MetadataServerProvider {
    client: reqwest::Client,
    base_url: String,
}

impl MetadataServerProvider {
    /// Create a provider talking to `metadata.google.internal`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CredentialError> {
        Self::with_base_url(format!("http://{DEFAULT_METADATA_HOST}"))
    }

    /// Create a provider honoring a `GCE_METADATA_HOST` override from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(METADATA_HOST_ENV)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string());
        Self::with_base_url(format!("http://{host}"))
    }

    /// Create a provider against an explicit base URL (scheme and host).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, CredentialError> {
        let client = reqwest::Client::builder()
            .timeout(METADATA_TIMEOUT)
            .build()
            .map_err(CredentialError::Unavailable)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The base URL tokens are requested from.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl IdentityTokenProvider for MetadataServerProvider {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn fetch_token(&self, audience: &str) -> Result<IdentityToken, CredentialError> {
        let url = format!("{}{IDENTITY_PATH}", self.base_url);
        debug!("Requesting identity token for audience {audience} from {url}");

        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .query(&[("audience", audience), ("format", "full")])
            .send()
            .await
            .map_err(|e| {
                error!("Metadata server unreachable: {e}");
                CredentialError::Unavailable(e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(CredentialError::Unavailable)?;

        if !status.is_success() {
            error!(
                "Metadata server refused identity token with status {}: {body}",
                status.as_u16()
            );
            return Err(CredentialError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token = body.trim();
        if token.is_empty() {
            return Err(CredentialError::EmptyToken);
        }

        Ok(IdentityToken::new(token, audience))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AUDIENCE: &str = "https://csa-agent-abc123-uc.a.run.app";

    #[tokio::test]
    async fn test_fetch_token_binds_audience() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(IDENTITY_PATH))
            .and(header("Metadata-Flavor", "Google"))
            .and(query_param("audience", AUDIENCE))
            .and(query_param("format", "full"))
            .respond_with(ResponseTemplate::new(200).set_body_string("eyJ.token.sig\n"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = MetadataServerProvider::with_base_url(mock_server.uri()).unwrap();
        let token = provider.fetch_token(AUDIENCE).await.unwrap();

        assert_eq!(token.audience(), AUDIENCE);
        assert_eq!(token.bearer(), "Bearer eyJ.token.sig");
    }

    #[tokio::test]
    async fn test_fetch_token_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(IDENTITY_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_string("service account not found"))
            .mount(&mock_server)
            .await;

        let provider = MetadataServerProvider::with_base_url(mock_server.uri()).unwrap();
        let err = provider.fetch_token(AUDIENCE).await.unwrap_err();

        match err {
            CredentialError::Rejected { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("service account"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_token_empty_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(IDENTITY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("  "))
            .mount(&mock_server)
            .await;

        let provider = MetadataServerProvider::with_base_url(mock_server.uri()).unwrap();
        let err = provider.fetch_token(AUDIENCE).await.unwrap_err();
        assert!(matches!(err, CredentialError::EmptyToken));
    }

    #[tokio::test]
    async fn test_fetch_token_unreachable() {
        // Nothing listens on the discard port.
        let provider = MetadataServerProvider::with_base_url("http://127.0.0.1:9").unwrap();
        let err = provider.fetch_token(AUDIENCE).await.unwrap_err();
        assert!(matches!(err, CredentialError::Unavailable(_)));
    }

    #[test]
    fn test_from_lookup_host_override() {
        let provider = MetadataServerProvider::from_lookup(|key| {
            (key == METADATA_HOST_ENV).then(|| "169.254.169.254".to_string())
        })
        .unwrap();
        assert_eq!(provider.base_url(), "http://169.254.169.254");

        let default = MetadataServerProvider::from_lookup(|_| None).unwrap();
        assert_eq!(default.base_url(), "http://metadata.google.internal");
    }
}
