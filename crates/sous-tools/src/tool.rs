//! Tool trait definition and metadata spec.

use async_trait::async_trait;
use serde_json::Value;
use sous_protocol::{ToolDescriptor, ToolError};
use std::fmt::Debug;

/// Tool metadata for discovery and schema presentation.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema for tool arguments.
    pub args_schema: Value,
}

impl From<ToolSpec> for ToolDescriptor {
    fn from(spec: ToolSpec) -> Self {
        ToolDescriptor::new(spec.name)
            .with_description(spec.description)
            .with_input_schema(spec.args_schema)
    }
}

/// Interface for executable tools served by the tool host.
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    /// Return the tool name.
    fn name(&self) -> &str;
    /// Return the tool description shown to the model.
    fn description(&self) -> &str;
    /// Return the JSON schema for tool arguments.
    fn args_schema(&self) -> Value;

    /// Invoke the tool with keyed arguments.
    async fn call(&self, args: Value) -> Result<Value, ToolError>;

    /// Build a `ToolSpec` describing this tool.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            args_schema: self.args_schema(),
        }
    }
}
