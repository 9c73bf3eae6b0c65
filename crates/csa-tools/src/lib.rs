//! # csa-tools
//!
//! Adapts the CSA forwarder to agent hosting frameworks that discover and
//! call capabilities as function-calling tools.
//!
//! - [`ToolImplementation`]: a tool's definition and execution logic
//! - [`ToolRegistry`]: concurrent name-to-tool map
//! - [`ToolExecutor`]: resolves a [`ToolCall`] to its tool and runs it
//! - [`InvokeCsaAgentTool`]: the `invoke_csa_agent` tool
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use csa_forwarder::{AuthenticatedForwarder, ForwarderConfig, MetadataServerProvider};
//! use csa_tools::{InvokeCsaAgentTool, ToolCall, ToolExecutor};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ForwarderConfig::new().with_agent_url("https://csa-agent-abc123-uc.a.run.app");
//! let forwarder = AuthenticatedForwarder::new(config, Arc::new(MetadataServerProvider::new()?))?;
//!
//! let mut executor = ToolExecutor::new();
//! executor.add_tool(InvokeCsaAgentTool::new(forwarder));
//!
//! let call: ToolCall = serde_json::from_str(
//!     r#"{"name": "invoke_csa_agent", "arguments": {"user_input": "Hi", "thread_id": "t-1"}}"#,
//! )?;
//! println!("{}", executor.execute_tool(&call).await?);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use serde_json::Value;

mod invoke_agent;
pub mod schema;

pub use invoke_agent::{INVOKE_CSA_AGENT, InvokeCsaAgentTool};
pub use schema::{FunctionCall, ObjectSchema, Property, Tool, ToolCall};

#[async_trait]
pub trait ToolImplementation: Send + Sync {
    fn get_definition(&self) -> Tool;

    async fn execute(&self, args: &Value) -> Result<String>;

    fn is_auto_approved(&self) -> bool {
        false
    }
}

pub struct ToolRegistry {
    tools: Arc<DashMap<String, Arc<dyn ToolImplementation>>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: Arc::new(DashMap::new()),
        }
    }

    /// Registers a tool under its definition's name, replacing any previous one.
    pub fn register(&self, tool: Arc<dyn ToolImplementation>) {
        let name = tool.get_definition().function.name;
        self.tools.insert(name, tool);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolImplementation>> {
        self.tools.get(name).map(|r| Arc::clone(r.value()))
    }

    #[must_use]
    pub fn get_all_definitions(&self) -> Vec<Tool> {
        let mut definitions: Vec<Tool> =
            self.tools.iter().map(|t| t.get_definition()).collect();
        definitions.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        definitions
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    #[must_use]
    pub fn is_tool_auto_approved(&self, name: &str) -> bool {
        self.tools.get(name).is_some_and(|t| t.is_auto_approved())
    }
}

pub struct ToolExecutor {
    registry: ToolRegistry,
}

impl ToolExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: ToolRegistry::new(),
        }
    }

    pub fn add_tool<T: ToolImplementation + 'static>(&mut self, tool: T) {
        self.registry.register(Arc::new(tool));
    }

    #[must_use]
    pub fn has_tool(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    #[must_use]
    pub fn get_all_tools(&self) -> Vec<Tool> {
        self.registry.get_all_definitions()
    }

    #[must_use]
    pub fn is_tool_auto_approved(&self, name: &str) -> bool {
        self.registry.is_tool_auto_approved(name)
    }

    /// Execute a tool call.
    ///
    /// # Errors
    /// Returns an error if the tool is not found or if execution fails.
    pub async fn execute_tool(&self, tool_call: &ToolCall) -> Result<String> {
        let function = &tool_call.function;

        let tool = self
            .registry
            .get(&function.name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: '{}'", function.name))?;

        debug!(
            "Executing tool '{}' (call id {:?})",
            function.name, tool_call.id
        );

        tool.execute(&function.parsed_arguments()).await
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}
