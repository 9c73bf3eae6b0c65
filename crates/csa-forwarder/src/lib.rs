//! # csa-forwarder
//!
//! Authenticated forwarding to the customer support agent (CSA) running on
//! Cloud Run.
//!
//! A call takes a user message and a conversation id, obtains an identity
//! token bound to the agent's URL, POSTs `{"userInput", "threadId"}` to the
//! agent and returns its `final_response`.
//!
//! - [`AuthenticatedForwarder`]: the forwarding call, with a structured
//!   [`forward`](AuthenticatedForwarder::forward) and a text-only
//!   [`relay`](AuthenticatedForwarder::relay) for hosting frameworks
//! - [`IdentityTokenProvider`]: where tokens come from
//!   ([`MetadataServerProvider`] on Google Cloud, [`StaticTokenProvider`] locally)
//! - [`ForwarderConfig`]: destination URL and timeout, injected at construction
//! - [`ForwardError`]: configuration, credential, remote service, and unexpected failures
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use csa_forwarder::{AuthenticatedForwarder, ForwardRequest, ForwarderConfig, MetadataServerProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ForwarderConfig::from_lookup(|key| std::env::var(key).ok());
//! let provider = MetadataServerProvider::from_lookup(|key| std::env::var(key).ok())?;
//! let forwarder = AuthenticatedForwarder::new(config, Arc::new(provider))?;
//!
//! match forwarder.forward(&ForwardRequest::new("Hi", "thread-1")).await {
//!     Ok(reply) => println!("{reply}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
mod forwarder;
pub mod wire;

pub use config::{DEFAULT_TIMEOUT, ForwarderConfig};
pub use credentials::{
    IdentityToken, IdentityTokenProvider, MetadataServerProvider, StaticTokenProvider,
};
pub use error::{CredentialError, ForwardError, UnexpectedError};
pub use forwarder::AuthenticatedForwarder;
pub use wire::{ForwardRequest, NO_RESPONSE_CONTENT};
