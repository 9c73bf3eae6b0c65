//! Identity tokens and the providers that mint them.
//!
//! Every token is bound to an audience, the full URL of the receiving
//! service. Providers are asked for a fresh token on each call; nothing
//! here caches.

use std::fmt;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::CredentialError;

mod fixed;
mod metadata;

pub use fixed::StaticTokenProvider;
pub use metadata::{METADATA_HOST_ENV, MetadataServerProvider};

/// A short-lived bearer credential scoped to one audience.
///
/// The token value is held in a [`SecretString`] and never shows up in
/// `Debug` output.
#[derive(Clone)]
pub struct IdentityToken {
    value: SecretString,
    audience: String,
}

impl IdentityToken {
    /// Wraps a raw token minted for `audience`.
    pub fn new(value: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            value: SecretString::from(value.into()),
            audience: audience.into(),
        }
    }

    /// The audience this token was minted for.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// The `Authorization` header value for this token.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value.expose_secret())
    }

    /// Fails unless the token is bound to exactly `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::AudienceMismatch`] when the audiences differ.
    pub fn ensure_audience(&self, expected: &str) -> Result<(), CredentialError> {
        if self.audience == expected {
            Ok(())
        } else {
            Err(CredentialError::AudienceMismatch {
                expected: expected.to_string(),
                actual: self.audience.clone(),
            })
        }
    }
}

impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityToken")
            .field("value", &"[REDACTED]")
            .field("audience", &self.audience)
            .finish()
    }
}

/// Source of identity tokens.
///
/// Implementations must bind the returned token to the requested audience.
#[async_trait]
pub trait IdentityTokenProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Mint a token for `audience`.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] if no token can be produced.
    async fn fetch_token(&self, audience: &str) -> Result<IdentityToken, CredentialError>;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let token = IdentityToken::new("eyJhbGciOiJSUzI1NiJ9.secret", "https://agent.run.app");
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("https://agent.run.app"));
    }

    #[test]
    fn test_bearer_header() {
        let token = IdentityToken::new("abc", "https://agent.run.app");
        assert_eq!(token.bearer(), "Bearer abc");
    }

    #[test]
    fn test_ensure_audience() {
        let token = IdentityToken::new("abc", "https://agent.run.app");
        assert!(token.ensure_audience("https://agent.run.app").is_ok());

        let err = token
            .ensure_audience("https://other.run.app")
            .unwrap_err();
        assert!(matches!(err, CredentialError::AudienceMismatch { .. }));
    }
}
