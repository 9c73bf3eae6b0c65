//! Error types for the wrapper binary.

use thiserror::Error;

use csa_forwarder::{CredentialError, ForwardError};

/// Errors that can occur while setting the wrapper up.
#[derive(Debug, Error)]
pub enum WrapperError {
    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The credential provider could not be set up.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// The forwarder could not be built.
    #[error("Forwarder error: {0}")]
    Forward(#[from] ForwardError),
}

/// Result type alias using `WrapperError`.
pub type Result<T> = std::result::Result<T, WrapperError>;
