//! Error types for the forwarder.

use thiserror::Error;

/// Reply returned to the hosting framework when the URL is not configured.
pub const CONFIGURATION_ERROR_REPLY: &str = "Error: The agent service URL is not configured.";

/// Reply returned to the hosting framework when no identity token could be obtained.
pub const CREDENTIAL_ERROR_REPLY: &str =
    "Error: Failed to get an authentication token for the agent service.";

/// Reply returned to the hosting framework for any unexpected failure.
pub const UNEXPECTED_ERROR_REPLY: &str =
    "An unexpected error occurred while contacting the agent service.";

/// Errors raised while obtaining an identity token.
///
/// These indicate a local or environment problem (no ambient credentials,
/// unreachable metadata server) rather than a rejection by the agent service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CredentialError {
    /// The credential source could not be reached.
    #[error("Credential source unavailable: {0}")]
    Unavailable(#[source] reqwest::Error),

    /// The credential source answered with a non-success status.
    #[error("Credential source rejected the request with status {status}: {body}")]
    Rejected {
        /// HTTP status returned by the credential source.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The credential source returned an empty token.
    #[error("Credential source returned an empty token")]
    EmptyToken,

    /// No credential is configured for this provider.
    #[error("No credentials available: {0}")]
    Missing(String),

    /// The token was minted for a different audience than the destination.
    #[error("Token audience '{actual}' does not match destination '{expected}'")]
    AudienceMismatch {
        /// The destination URL the token was needed for.
        expected: String,
        /// The audience the provider actually bound the token to.
        actual: String,
    },
}

/// Failures that are neither configuration, credential, nor remote rejections.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UnexpectedError {
    /// The request exceeded the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Connection, DNS, TLS or body transfer failure.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The response body was not valid JSON.
    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// The response body was valid JSON but not an object.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for UnexpectedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Network(err)
        }
    }
}

/// Errors that can occur while forwarding a message to the agent service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ForwardError {
    /// The destination URL is missing or invalid. No request was attempted.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An identity token could not be obtained. No request was attempted.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// The agent service answered with a non-2xx status.
    #[error("Remote service error {status}: {body}")]
    RemoteService {
        /// HTTP status code returned by the agent service.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Any other failure while talking to the agent service.
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] UnexpectedError),
}

impl From<reqwest::Error> for ForwardError {
    fn from(err: reqwest::Error) -> Self {
        Self::Unexpected(err.into())
    }
}

impl From<serde_json::Error> for ForwardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unexpected(err.into())
    }
}

impl ForwardError {
    /// The text handed back to the hosting framework for this error.
    ///
    /// Details stay in the logs; only the status code of a remote failure
    /// is exposed to the caller.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => CONFIGURATION_ERROR_REPLY.to_string(),
            Self::Credential(_) => CREDENTIAL_ERROR_REPLY.to_string(),
            Self::RemoteService { status, .. } => {
                format!("Error: The agent service returned an error: {status}")
            }
            Self::Unexpected(_) => UNEXPECTED_ERROR_REPLY.to_string(),
        }
    }

    /// Check if this is a configuration error.
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a credential error.
    pub const fn is_credential_error(&self) -> bool {
        matches!(self, Self::Credential(_))
    }

    /// Check if the request timed out.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Unexpected(UnexpectedError::Timeout(_)))
    }

    /// HTTP status of a remote failure, if this is one.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteService { status, .. } => Some(*status),
            _ => None,
        }
    }
}
