//! MCP client session against a child-process tool host.

use crate::registry::to_function_tools;
use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, PaginatedRequestParam, RawContent,
    Tool as McpTool,
};
use rmcp::service::{Peer, RunningService};
use rmcp::transport::TokioChildProcess;
use rmcp::RoleClient;
use serde_json::Value;
use sous_config::ToolHostConfig;
use sous_protocol::{
    ContentBlock, FunctionTool, ToolArguments, ToolDescriptor, ToolError, ToolHost,
    ToolHostLauncher, ToolOutput,
};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// Subcommand the `sous` binary uses to run its own tool server.
pub const DEFAULT_TOOL_SERVER_ARG: &str = "tool-server";

/// A running MCP client connected to one tool host process.
pub struct McpToolSession {
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
    request_timeout: Duration,
}

impl McpToolSession {
    /// Spawn the configured tool host and complete the MCP handshake.
    pub async fn connect(config: &ToolHostConfig) -> Result<Self, ToolError> {
        let request_timeout = Duration::from_secs(config.timeout_secs);
        let command = tool_host_command(config)?;
        debug!("spawning tool host (command={:?})", command.as_std());
        let transport = TokioChildProcess::new(command)
            .map_err(|err| ToolError::Transport(format!("failed to spawn tool host: {err}")))?;

        let service = tokio::time::timeout(request_timeout, rmcp::serve_client((), transport))
            .await
            .map_err(|_| {
                ToolError::Timeout(format!(
                    "tool host handshake took longer than {request_timeout:?}"
                ))
            })?
            .map_err(|err| ToolError::Transport(format!("tool host handshake failed: {err}")))?;

        info!("tool host connected (timeout_secs={})", config.timeout_secs);
        Ok(Self {
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            request_timeout,
        })
    }

    async fn with_timeout<T, E: std::fmt::Display>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, ToolError> {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .map_err(|_| {
                ToolError::Timeout(format!(
                    "{operation} took longer than {:?}",
                    self.request_timeout
                ))
            })?
            .map_err(|err| ToolError::Transport(format!("{operation} failed: {err}")))
    }
}

#[async_trait]
impl ToolHost for McpToolSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let mut descriptors = Vec::new();
        let mut cursor = None;
        loop {
            let page = self
                .with_timeout(
                    "tools/list",
                    self.peer.list_tools(Some(PaginatedRequestParam { cursor })),
                )
                .await?;
            descriptors.extend(page.tools.into_iter().map(descriptor_from_mcp));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        debug!("tool host listed tools (count={})", descriptors.len());
        Ok(descriptors)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: ToolArguments,
    ) -> Result<ToolOutput, ToolError> {
        let request = CallToolRequestParam {
            name: name.to_string().into(),
            arguments: Some(arguments),
        };
        let result = self
            .with_timeout("tools/call", self.peer.call_tool(request))
            .await?;
        output_from_result(result)
    }

    async fn close(&self) -> Result<(), ToolError> {
        let service = self.service.lock().take();
        let Some(service) = service else {
            return Ok(());
        };
        let reason = service
            .cancel()
            .await
            .map_err(|err| ToolError::Transport(format!("tool host shutdown failed: {err}")))?;
        debug!("tool host closed (reason={reason:?})");
        Ok(())
    }
}

fn tool_host_command(config: &ToolHostConfig) -> Result<Command, ToolError> {
    let (program, args) = match &config.command {
        Some(command) => (PathBuf::from(command), config.args.clone()),
        None => {
            let exe = std::env::current_exe().map_err(|err| {
                ToolError::Transport(format!("cannot locate the sous executable: {err}"))
            })?;
            let args = if config.args.is_empty() {
                vec![DEFAULT_TOOL_SERVER_ARG.to_string()]
            } else {
                config.args.clone()
            };
            (exe, args)
        }
    };
    let mut command = Command::new(program);
    command.args(args).envs(&config.env).kill_on_drop(true);
    if let Some(cwd) = &config.cwd {
        command.current_dir(cwd);
    }
    Ok(command)
}

fn descriptor_from_mcp(tool: McpTool) -> ToolDescriptor {
    let mut descriptor = ToolDescriptor::new(tool.name.to_string())
        .with_input_schema(Value::Object((*tool.input_schema).clone()));
    if let Some(description) = tool.description {
        descriptor = descriptor.with_description(description.to_string());
    }
    descriptor
}

/// Shape an MCP call result as a tool output.
///
/// Error results become `ExecutionFailed` carrying their joined text.
/// Results without content fall back to their structured payload.
fn output_from_result(result: CallToolResult) -> Result<ToolOutput, ToolError> {
    if result.is_error.unwrap_or(false) {
        let message = result
            .content
            .iter()
            .filter_map(|content| match &content.raw {
                RawContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        return Err(ToolError::ExecutionFailed(message));
    }
    if result.content.is_empty() {
        return Ok(match result.structured_content {
            Some(value) => ToolOutput::from_value(value),
            None => ToolOutput::Sequence(Vec::new()),
        });
    }
    Ok(ToolOutput::Sequence(
        result.content.iter().map(block_from_content).collect(),
    ))
}

fn block_from_content(content: &Content) -> ContentBlock {
    match &content.raw {
        RawContent::Text(text) => ContentBlock::Text(text.text.clone()),
        _ => ContentBlock::Opaque(serde_json::to_value(content).unwrap_or_default()),
    }
}

/// Launches one MCP session per request.
#[derive(Debug, Clone)]
pub struct McpLauncher {
    config: ToolHostConfig,
}

impl McpLauncher {
    pub fn new(config: ToolHostConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ToolHostLauncher for McpLauncher {
    async fn launch(&self) -> Result<Box<dyn ToolHost>, ToolError> {
        let session = McpToolSession::connect(&self.config).await?;
        Ok(Box::new(session))
    }
}

/// Connect to the tool host and translate its registry for the model.
pub async fn bootstrap(
    config: &ToolHostConfig,
) -> Result<(McpToolSession, Vec<FunctionTool>), ToolError> {
    let session = McpToolSession::connect(config).await?;
    let descriptors = match session.list_tools().await {
        Ok(descriptors) => descriptors,
        Err(err) => {
            if let Err(close_err) = session.close().await {
                warn!("tool host close failed after listing error (error={close_err})");
            }
            return Err(err);
        }
    };
    let tools = to_function_tools(&descriptors);
    info!("tool registry loaded (tools={})", tools.len());
    Ok((session, tools))
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_TOOL_SERVER_ARG, output_from_result, tool_host_command};
    use pretty_assertions::assert_eq;
    use rmcp::model::{CallToolResult, Content};
    use serde_json::json;
    use sous_config::ToolHostConfig;
    use sous_protocol::{ContentBlock, ToolError, ToolOutput};
    use std::ffi::OsStr;
    use std::path::Path;

    #[test]
    fn text_results_become_text_blocks() {
        let result = CallToolResult::success(vec![Content::text("[]"), Content::text("more")]);
        assert_eq!(
            output_from_result(result).expect("output"),
            ToolOutput::Sequence(vec![
                ContentBlock::Text("[]".to_string()),
                ContentBlock::Text("more".to_string()),
            ])
        );
    }

    #[test]
    fn error_results_carry_their_text() {
        let result = CallToolResult::error(vec![Content::text("invalid arguments: missing item")]);
        let err = output_from_result(result).unwrap_err();
        assert!(
            matches!(err, ToolError::ExecutionFailed(message) if message == "invalid arguments: missing item")
        );
    }

    #[test]
    fn structured_content_is_used_when_content_is_empty() {
        let mut result = CallToolResult::success(Vec::new());
        result.structured_content = Some(json!({ "id": "chili" }));
        assert_eq!(
            output_from_result(result).expect("output"),
            ToolOutput::from_value(json!({ "id": "chili" }))
        );
    }

    #[test]
    fn default_command_runs_own_tool_server() {
        let command = tool_host_command(&ToolHostConfig::default()).expect("command");
        let args: Vec<_> = command
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();
        assert_eq!(args, vec![DEFAULT_TOOL_SERVER_ARG.to_string()]);
    }

    #[test]
    fn explicit_command_keeps_args_env_and_cwd() {
        let mut config = ToolHostConfig {
            command: Some("uv".to_string()),
            args: vec!["run".to_string(), "mcp_server.py".to_string()],
            cwd: Some("/tmp".to_string()),
            ..ToolHostConfig::default()
        };
        config
            .env
            .insert("SOUS_DB_PATH".to_string(), "data/test.db".to_string());
        let command = tool_host_command(&config).expect("command");
        let spawned = command.as_std();
        assert_eq!(spawned.get_program(), "uv");
        assert_eq!(spawned.get_args().count(), 2);
        assert_eq!(spawned.get_current_dir(), Some(Path::new("/tmp")));
        assert!(spawned.get_envs().any(|(key, value)| {
            key == "SOUS_DB_PATH" && value == Some(OsStr::new("data/test.db"))
        }));
    }
}
