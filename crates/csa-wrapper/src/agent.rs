//! Router agent manifest.
//!
//! The hosting framework runs a small model whose only job is to pass each
//! user message to `invoke_csa_agent` unchanged. This module describes that
//! agent, and how it should be deployed, as JSON for external tooling.

use std::collections::BTreeMap;

use serde::Serialize;
use typed_builder::TypedBuilder;

use csa_forwarder::config::AGENT_URL_ENV;
use csa_tools::{INVOKE_CSA_AGENT, Tool};

use crate::error::{Result, WrapperError};

/// Model the router agent runs on.
pub const ROUTER_MODEL: &str = "gemini-2.0-flash-001";

/// Instructions that keep the router from answering on its own.
pub const ROUTER_INSTRUCTIONS: &str = "You are a simple router. Your only task is to receive the user's message and the conversation's thread_id and immediately call the `invoke_csa_agent` tool with the exact same inputs. Do not modify the input or try to answer the user directly.";

/// The router agent and its deployment settings.
#[derive(Debug, Clone, Serialize, TypedBuilder)]
pub struct AgentManifest {
    #[builder(default = ROUTER_MODEL.to_string(), setter(into))]
    pub model: String,
    #[builder(default = ROUTER_INSTRUCTIONS.to_string(), setter(into))]
    pub system_instructions: String,
    pub tools: Vec<Tool>,
    pub deployment: Deployment,
}

/// How the router agent is packaged for remote hosting.
#[derive(Debug, Clone, Serialize, TypedBuilder)]
pub struct Deployment {
    #[builder(default = "CSA Hybrid Wrapper Agent".to_string(), setter(into))]
    pub display_name: String,
    #[builder(
        default = "A lightweight wrapper that calls the main Node.js agent on Cloud Run.".to_string(),
        setter(into)
    )]
    pub description: String,
    #[builder(default = "csa_hybrid_wrapper_deployment".to_string(), setter(into))]
    pub gcs_dir_name: String,
    pub env_vars: BTreeMap<String, String>,
}

/// Builds the router manifest for the given agent URL and registered tools.
///
/// # Errors
///
/// Returns an error if the agent URL is unset, or if `invoke_csa_agent` is
/// not among `tools`.
pub fn router_manifest(agent_url: Option<&str>, tools: Vec<Tool>) -> Result<AgentManifest> {
    let agent_url = agent_url.filter(|u| !u.trim().is_empty()).ok_or_else(|| {
        WrapperError::Config(format!(
            "Cannot build deployment manifest: {AGENT_URL_ENV} must be set"
        ))
    })?;

    if !tools.iter().any(|t| t.name() == INVOKE_CSA_AGENT) {
        return Err(WrapperError::Config(format!(
            "Router agent requires the {INVOKE_CSA_AGENT} tool"
        )));
    }

    let env_vars = BTreeMap::from([(AGENT_URL_ENV.to_string(), agent_url.trim().to_string())]);

    Ok(AgentManifest::builder()
        .tools(tools)
        .deployment(Deployment::builder().env_vars(env_vars).build())
        .build())
}
