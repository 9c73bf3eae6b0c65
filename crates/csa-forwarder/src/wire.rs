//! JSON shapes exchanged with the agent service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UnexpectedError;

/// Reply used when the agent service answers without a `final_response`.
pub const NO_RESPONSE_CONTENT: &str = "No response content found.";

/// One message for the agent service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardRequest {
    /// The user's original message.
    pub user_input: String,
    /// Opaque conversation identifier.
    pub thread_id: String,
}

impl ForwardRequest {
    /// Create a new request.
    pub fn new(user_input: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            thread_id: thread_id.into(),
        }
    }
}

/// Request body on the wire: `{"userInput": ..., "threadId": ...}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AgentRequestBody<'a> {
    pub user_input: &'a str,
    pub thread_id: &'a str,
}

impl<'a> From<&'a ForwardRequest> for AgentRequestBody<'a> {
    fn from(request: &'a ForwardRequest) -> Self {
        Self {
            user_input: &request.user_input,
            thread_id: &request.thread_id,
        }
    }
}

/// Pulls the reply text out of a successful response body.
///
/// An empty body, a missing field, or a `null` field all yield
/// [`NO_RESPONSE_CONTENT`]. Non-string values are returned as their JSON text.
pub(crate) fn extract_final_response(body: &str) -> Result<String, UnexpectedError> {
    if body.trim().is_empty() {
        return Ok(NO_RESPONSE_CONTENT.to_string());
    }

    let value: Value = serde_json::from_str(body)?;
    let object = value.as_object().ok_or_else(|| {
        UnexpectedError::InvalidResponse(format!("expected a JSON object, got: {value}"))
    })?;

    Ok(match object.get("final_response") {
        None | Some(Value::Null) => NO_RESPONSE_CONTENT.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    })
}
