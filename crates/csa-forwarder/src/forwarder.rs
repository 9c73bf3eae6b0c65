//! The authenticated forwarding call.
//!
//! One invocation is one identity-token fetch followed by one POST to the
//! agent service. There are no retries and nothing is cached between calls;
//! clones share only the HTTP connection pool.

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::config::ForwarderConfig;
use crate::credentials::IdentityTokenProvider;
use crate::error::{ForwardError, UnexpectedError};
use crate::wire::{AgentRequestBody, ForwardRequest, extract_final_response};

/// Forwards user messages to the agent service with an audience-bound identity token.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use csa_forwarder::{AuthenticatedForwarder, ForwarderConfig, MetadataServerProvider};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ForwarderConfig::new().with_agent_url("https://csa-agent-abc123-uc.a.run.app");
/// let forwarder = AuthenticatedForwarder::new(config, Arc::new(MetadataServerProvider::new()?))?;
///
/// let reply = forwarder.relay("Where is my order?", "thread-42").await;
/// println!("{reply}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthenticatedForwarder {
    client: reqwest::Client,
    credentials: Arc<dyn IdentityTokenProvider>,
    config: Arc<ForwarderConfig>,
}

impl std::fmt::Debug for AuthenticatedForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedForwarder")
            .field("credentials", &self.credentials.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AuthenticatedForwarder {
    /// Create a forwarder from an injected configuration and token provider.
    ///
    /// A missing agent URL is not an error here; it is reported by every
    /// call to [`forward`](Self::forward) instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: ForwarderConfig,
        credentials: Arc<dyn IdentityTokenProvider>,
    ) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            credentials,
            config: Arc::new(config),
        })
    }

    /// The configuration this forwarder was built with.
    #[must_use]
    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    /// Forward one message and return the agent's reply.
    ///
    /// # Errors
    ///
    /// - [`ForwardError::Configuration`] if the agent URL is missing or invalid
    /// - [`ForwardError::Credential`] if no token bound to the agent URL can be obtained
    /// - [`ForwardError::RemoteService`] if the agent answers with a non-2xx status
    /// - [`ForwardError::Unexpected`] for timeouts, network failures and malformed replies
    pub async fn forward(&self, request: &ForwardRequest) -> Result<String, ForwardError> {
        let result = self.send(request).await;
        match &result {
            Ok(_) => info!(
                "Received response from CSA agent for thread {}",
                request.thread_id
            ),
            Err(e) => log_failure(e, &request.thread_id),
        }
        result
    }

    /// Forward one message and always produce text for the hosting framework.
    ///
    /// Failures are logged with full context and replaced by a short
    /// descriptive message.
    pub async fn relay(&self, user_input: &str, thread_id: &str) -> String {
        let request = ForwardRequest::new(user_input, thread_id);
        match self.forward(&request).await {
            Ok(reply) => reply,
            Err(e) => e.user_message(),
        }
    }

    async fn send(&self, request: &ForwardRequest) -> Result<String, ForwardError> {
        let destination = self.config.destination()?;

        info!(
            "Invoking CSA agent at {} for thread {}",
            destination.audience, request.thread_id
        );

        let token = self.credentials.fetch_token(destination.audience).await?;
        token.ensure_audience(destination.audience)?;

        let body = serde_json::to_string(&AgentRequestBody::from(request))?;

        let response = self
            .client
            .post(destination.url)
            .header("Authorization", token.bearer())
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                warn!("Failed to read error response body: {e}");
                String::new()
            });
            return Err(ForwardError::RemoteService {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        debug!("Raw CSA agent response: {body}");

        Ok(extract_final_response(&body)?)
    }
}

fn log_failure(err: &ForwardError, thread_id: &str) {
    match err {
        ForwardError::Configuration(msg) => {
            error!("Cannot invoke CSA agent for thread {thread_id}: {msg}");
        }
        ForwardError::Credential(e) => {
            error!("Error getting identity token for thread {thread_id}: {e}");
        }
        ForwardError::RemoteService { status, body } => {
            error!("CSA agent returned HTTP {status} for thread {thread_id}: {body}");
        }
        ForwardError::Unexpected(UnexpectedError::Timeout(e)) => {
            error!("CSA agent timed out for thread {thread_id}: {e}");
        }
        ForwardError::Unexpected(e) => {
            error!("Unexpected error contacting CSA agent for thread {thread_id}: {e}");
        }
    }
}
