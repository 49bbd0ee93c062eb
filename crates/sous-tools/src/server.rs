//! MCP server exposing a `ToolRegistry` over stdio.

use crate::ToolRegistry;
use log::{debug, info, warn};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorData, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler, ServiceExt};
use serde_json::{Map, Value};
use sous_protocol::ToolError;
use std::sync::Arc;

const INSTRUCTIONS: &str = "Pantry and recipe store. Pantry tools list, add, update, and remove \
ingredients; recipe tools search, fetch, and save recipes.";

/// MCP handler dispatching `tools/list` and `tools/call` to a registry.
#[derive(Clone)]
pub struct RecipeToolServer {
    registry: ToolRegistry,
}

impl RecipeToolServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Tool declarations in MCP form, in registration order.
    pub fn mcp_tools(&self) -> Vec<McpTool> {
        self.registry
            .specs()
            .into_iter()
            .map(|spec| {
                let schema = match spec.args_schema {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                McpTool::new(spec.name, spec.description, Arc::new(schema))
            })
            .collect()
    }

    /// Run one tool and shape its value as an MCP result.
    ///
    /// Strings become a single text block; every other value becomes one
    /// text block holding its compact JSON. Tool failures are reported as
    /// error results rather than protocol errors.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, ToolError> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::ToolNotFound(name.to_string()))?;
        let args = Value::Object(arguments.unwrap_or_default());
        match tool.call(args).await {
            Ok(value) => {
                debug!("tool call succeeded (tool={name})");
                Ok(CallToolResult::success(vec![Content::text(render_value(
                    value,
                ))]))
            }
            Err(err) => {
                warn!("tool call failed (tool={name}, error={err})");
                Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
            }
        }
    }
}

fn render_value(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

impl ServerHandler for RecipeToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.mcp_tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        match self.dispatch(&request.name, request.arguments).await {
            Ok(result) => Ok(result),
            Err(err) => Err(ErrorData::invalid_params(err.to_string(), None)),
        }
    }
}

/// Serve the registry over stdin/stdout until the client disconnects.
pub async fn serve_stdio(registry: ToolRegistry) -> Result<(), ToolError> {
    info!(
        "starting tool server on stdio (tools={})",
        registry.list().len()
    );
    let service = RecipeToolServer::new(registry)
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|err| ToolError::Transport(err.to_string()))?;
    let reason = service
        .waiting()
        .await
        .map_err(|err| ToolError::Transport(err.to_string()))?;
    info!("tool server stopped (reason={reason:?})");
    Ok(())
}
