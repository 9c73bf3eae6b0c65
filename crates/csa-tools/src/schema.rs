//! Tool definition and tool call types, in the function-calling shape
//! agent hosting frameworks expect.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A callable capability advertised to the hosting agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tool {
    /// Always `"function"`.
    pub r#type: String,
    /// Name, description and input schema.
    pub function: Function,
}

impl Tool {
    /// Create a function tool.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: &ObjectSchema,
    ) -> Self {
        Self {
            r#type: "function".to_string(),
            function: Function {
                name: name.into(),
                description: description.into(),
                parameters: serde_json::to_value(parameters).unwrap_or(Value::Null),
            },
        }
    }

    /// The tool's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Function metadata of a [`Tool`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Function {
    /// Unique name the agent calls the tool by.
    pub name: String,
    /// What the tool does, shown to the model.
    pub description: String,
    /// JSON schema of the arguments.
    pub parameters: Value,
}

/// An object schema with named properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectSchema {
    /// Always `"object"`.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property name to definition.
    pub properties: BTreeMap<String, Property>,
    /// Names of required properties.
    pub required: Vec<String>,
}

impl ObjectSchema {
    /// An object schema with no properties.
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Add a required property.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>, property: Property) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), property);
        self.required.push(name);
        self
    }
}

impl Default for ObjectSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// A single property of an [`ObjectSchema`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    /// JSON type name.
    #[serde(rename = "type")]
    pub prop_type: String,
    /// Human-readable description.
    pub description: String,
}

impl Property {
    /// A string property.
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: description.into(),
        }
    }
}

/// A request from the hosting agent to run a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Call identifier assigned by the host, if any.
    #[serde(default)]
    pub id: Option<String>,
    /// Which tool, with which arguments.
    #[serde(flatten)]
    pub function: FunctionCall,
}

/// Name and arguments of a [`ToolCall`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    /// Name of the tool to run.
    pub name: String,
    /// Arguments as a JSON object, or a string holding encoded JSON.
    #[serde(default)]
    pub arguments: Value,
}

impl FunctionCall {
    /// Normalizes the arguments to a JSON value.
    ///
    /// Missing arguments become `{}`; a string is decoded as JSON when it
    /// parses and kept as a plain string otherwise.
    #[must_use]
    pub fn parsed_arguments(&self) -> Value {
        match &self.arguments {
            Value::Null => Value::Object(serde_json::Map::new()),
            Value::String(encoded) if encoded.trim().is_empty() => {
                Value::Object(serde_json::Map::new())
            }
            Value::String(encoded) => {
                serde_json::from_str(encoded).unwrap_or_else(|_| Value::String(encoded.clone()))
            }
            other => other.clone(),
        }
    }
}
