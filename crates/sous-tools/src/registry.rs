//! Registry for tool implementations.

use crate::tool::{Tool, ToolSpec};
use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;

/// In-memory registry. Tools are listed in registration order.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Arc<RwLock<Vec<Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name in place.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        debug!("registering tool (name={})", tool.name());
        let mut tools = self.tools.write();
        match tools.iter().position(|existing| existing.name() == tool.name()) {
            Some(idx) => tools[idx] = tool,
            None => tools.push(tool),
        }
    }

    /// Fetch a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .read()
            .iter()
            .find(|tool| tool.name() == name)
            .cloned()
    }

    /// List all registered tool names.
    pub fn list(&self) -> Vec<String> {
        self.tools
            .read()
            .iter()
            .map(|tool| tool.name().to_string())
            .collect()
    }

    /// Return tool specs for all registered tools.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.read().iter().map(|tool| tool.spec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ToolRegistry;
    use crate::Tool;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use sous_protocol::ToolError;
    use std::sync::Arc;

    #[derive(Debug)]
    struct EchoTool {
        name: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "echo"
        }

        fn args_schema(&self) -> Value {
            json!({ "type": "object" })
        }

        async fn call(&self, _args: Value) -> Result<Value, ToolError> {
            Ok(json!(self.reply))
        }
    }

    #[tokio::test]
    async fn register_keeps_order_and_replaces_by_name() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool { name: "b", reply: "first" }));
        registry.register(Arc::new(EchoTool { name: "a", reply: "a" }));
        registry.register(Arc::new(EchoTool { name: "b", reply: "second" }));

        assert_eq!(registry.list(), vec!["b".to_string(), "a".to_string()]);
        let tool = registry.get("b").expect("tool");
        assert_eq!(tool.call(json!({})).await.expect("call"), json!("second"));
        assert!(registry.get("missing").is_none());
    }
}
