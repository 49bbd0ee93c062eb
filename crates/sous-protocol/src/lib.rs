//! Wire protocol types shared by the Sous orchestrator, tool host, and adapters.
//!
//! This crate owns the chat message shapes spoken to the model backend, the
//! tool descriptor and tool output shapes spoken to the tool host, and the two
//! trait seams (`ModelBackend`, `ToolHost`) the orchestrator drives.

mod chat;
mod model;
mod tool;

pub use chat::{ChatMessage, FunctionCall, FunctionDeclaration, FunctionTool, Role, ToolCall};
pub use model::{ModelBackend, ModelError};
pub use tool::{
    ContentBlock, ToolArguments, ToolDescriptor, ToolError, ToolHost, ToolHostLauncher,
    ToolOutput,
};
