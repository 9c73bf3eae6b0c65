//! Pre-minted identity token, for local runs.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::{IdentityToken, IdentityTokenProvider};
use crate::error::CredentialError;

/// Hands out one pre-minted token, e.g. from `gcloud auth print-identity-token`.
///
/// The token is assumed to have been minted for whatever audience is asked
/// for; the agent service rejects it if that is not true.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: Option<SecretString>,
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl StaticTokenProvider {
    /// Create a provider that returns `token`. Blank tokens count as missing.
    #[must_use]
    pub fn new(token: Option<SecretString>) -> Self {
        let token = token.filter(|t| !t.expose_secret().trim().is_empty());
        Self { token }
    }
}

#[async_trait]
impl IdentityTokenProvider for StaticTokenProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_token(&self, audience: &str) -> Result<IdentityToken, CredentialError> {
        let token = self.token.as_ref().ok_or_else(|| {
            CredentialError::Missing("no static identity token configured".to_string())
        })?;
        Ok(IdentityToken::new(token.expose_secret().trim(), audience))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticTokenProvider::new(Some(SecretString::from("tok-123")));
        let token = provider.fetch_token("https://agent.run.app").await.unwrap();
        assert_eq!(token.bearer(), "Bearer tok-123");
        assert_eq!(token.audience(), "https://agent.run.app");
    }

    #[tokio::test]
    async fn test_missing_token() {
        let empty = StaticTokenProvider::new(Some(SecretString::from("  ")));
        let none = StaticTokenProvider::new(None);

        assert!(matches!(
            empty.fetch_token("https://agent.run.app").await,
            Err(CredentialError::Missing(_))
        ));
        assert!(matches!(
            none.fetch_token("https://agent.run.app").await,
            Err(CredentialError::Missing(_))
        ));
    }

    #[test]
    fn test_debug_redacts() {
        let provider = StaticTokenProvider::new(Some(SecretString::from("tok-123")));
        assert!(!format!("{provider:?}").contains("tok-123"));
    }
}
