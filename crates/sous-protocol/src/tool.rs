//! Tool host shapes: descriptors, outputs, and the host capability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical keyed argument set passed to a tool.
pub type ToolArguments = Map<String, Value>;

/// Tool metadata as declared by the tool host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    /// Tool name, unique within one registry snapshot.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// JSON schema for accepted arguments.
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// Raw payload returned by one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// No payload.
    Null,
    /// A bare string, number, or boolean.
    Scalar(Value),
    /// Ordered content blocks.
    Sequence(Vec<ContentBlock>),
    /// A keyed structure.
    Keyed(Map<String, Value>),
}

/// One unit of a tool result payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// Plain text.
    Text(String),
    /// Any other structured block, kept raw.
    Opaque(Value),
}

impl ToolOutput {
    /// Classify an arbitrary JSON value.
    ///
    /// Array elements that expose a string `text` attribute become text
    /// blocks; every other element is kept as an opaque block.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => ToolOutput::Null,
            Value::Bool(_) | Value::Number(_) | Value::String(_) => ToolOutput::Scalar(value),
            Value::Array(items) => {
                ToolOutput::Sequence(items.into_iter().map(ContentBlock::from_value).collect())
            }
            Value::Object(map) => ToolOutput::Keyed(map),
        }
    }

    /// Convenience for a single text block result.
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutput::Sequence(vec![ContentBlock::Text(text.into())])
    }
}

impl ContentBlock {
    pub fn from_value(value: Value) -> Self {
        if let Some(text) = value.get("text").and_then(Value::as_str) {
            return ContentBlock::Text(text.to_string());
        }
        ContentBlock::Opaque(value)
    }
}

/// Errors returned by tools and tool hosts.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool name was not found in the registry.
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    /// Tool received invalid arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Tool execution failed on the host side.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// The connection to the tool host failed.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The tool host did not answer in time.
    #[error("timed out: {0}")]
    Timeout(String),
}

/// A live connection to a process exposing named tools.
///
/// Tools are resolved by name at runtime; there are no static bindings.
#[async_trait]
pub trait ToolHost: Send + Sync {
    /// Fetch the current tool registry.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError>;

    /// Invoke one tool and wait for its complete result.
    async fn call_tool(&self, name: &str, arguments: ToolArguments)
    -> Result<ToolOutput, ToolError>;

    /// Tear the connection down. Hosts without resources keep the default.
    async fn close(&self) -> Result<(), ToolError> {
        Ok(())
    }
}

/// Factory for fresh tool host sessions.
#[async_trait]
pub trait ToolHostLauncher: Send + Sync {
    /// Establish a new session.
    async fn launch(&self) -> Result<Box<dyn ToolHost>, ToolError>;
}
