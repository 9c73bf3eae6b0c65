use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use csa_forwarder::AuthenticatedForwarder;

use crate::ToolImplementation;
use crate::schema::{ObjectSchema, Property, Tool};

/// Name the hosting agent calls the forwarder by.
pub const INVOKE_CSA_AGENT: &str = "invoke_csa_agent";

#[derive(Debug, Deserialize)]
struct InvokeArgs {
    user_input: String,
    thread_id: String,
}

/// Exposes an [`AuthenticatedForwarder`] as the `invoke_csa_agent` tool.
///
/// Forwarding failures come back as descriptive text, not as errors; only
/// unusable arguments make `execute` fail.
#[derive(Debug, Clone)]
pub struct InvokeCsaAgentTool {
    forwarder: AuthenticatedForwarder,
}

impl InvokeCsaAgentTool {
    #[must_use]
    pub const fn new(forwarder: AuthenticatedForwarder) -> Self {
        Self { forwarder }
    }
}

#[async_trait]
impl ToolImplementation for InvokeCsaAgentTool {
    fn get_definition(&self) -> Tool {
        let schema = ObjectSchema::new()
            .required("user_input", Property::string("The user's original message."))
            .required("thread_id", Property::string("The unique ID for the conversation."));

        Tool::function(
            INVOKE_CSA_AGENT,
            "Forwards the user's request to the main customer support agent for processing.",
            &schema,
        )
    }

    async fn execute(&self, args: &Value) -> Result<String> {
        let args: InvokeArgs = serde_json::from_value(args.clone())
            .map_err(|e| anyhow::anyhow!("Invalid arguments for {INVOKE_CSA_AGENT}: {e}"))?;

        Ok(self.forwarder.relay(&args.user_input, &args.thread_id).await)
    }

    fn is_auto_approved(&self) -> bool {
        // The hosting agent is a pure router; every call goes straight through.
        true
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::sync::Arc;

    use csa_forwarder::{ForwarderConfig, StaticTokenProvider};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn tool_for(url: Option<String>) -> InvokeCsaAgentTool {
        let mut config = ForwarderConfig::new();
        if let Some(url) = url {
            config = config.with_agent_url(url);
        }
        let provider = StaticTokenProvider::new(Some("local-token".into()));
        InvokeCsaAgentTool::new(AuthenticatedForwarder::new(config, Arc::new(provider)).unwrap())
    }

    #[test]
    fn test_definition_schema() {
        let definition = tool_for(None).get_definition();

        assert_eq!(definition.name(), INVOKE_CSA_AGENT);
        assert_eq!(
            definition.function.parameters["required"],
            json!(["user_input", "thread_id"])
        );
        assert_eq!(
            definition.function.parameters["properties"]["thread_id"]["type"],
            "string"
        );
    }

    #[tokio::test]
    async fn test_execute_forwards_arguments() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer local-token"))
            .and(body_json(json!({"userInput": "Reset my password", "threadId": "t-7"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"final_response": "A reset link is on its way."})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let tool = tool_for(Some(mock_server.uri()));
        let result = tool
            .execute(&json!({"user_input": "Reset my password", "thread_id": "t-7"}))
            .await
            .unwrap();

        assert_eq!(result, "A reset link is on its way.");
    }

    #[tokio::test]
    async fn test_execute_reports_failures_as_text() {
        let result = tool_for(None)
            .execute(&json!({"user_input": "hi", "thread_id": "t-1"}))
            .await
            .unwrap();

        assert!(result.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_execute_rejects_missing_argument() {
        let result = tool_for(None).execute(&json!({"user_input": "hi"})).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("thread_id"));
    }

    #[test]
    fn test_auto_approved() {
        assert!(tool_for(None).is_auto_approved());
    }
}
