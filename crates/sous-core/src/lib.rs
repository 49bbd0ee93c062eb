//! Tool-calling orchestration for Sous.
//!
//! This crate owns the turn loop that alternates between the model backend
//! and the tool host, the adapters on both sides of it (registry translation,
//! argument normalization, result encoding), and the concrete Ollama and MCP
//! clients used outside of tests.

pub mod arguments;
pub mod backend;
pub mod chat;
pub mod encoding;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod session;

pub use arguments::{MalformedArguments, normalize_arguments};
pub use backend::OllamaBackend;
pub use chat::{ChatService, HistoryMessage, HistoryRole};
pub use encoding::{encode_tool_output, preview_tool_output};
pub use error::SousCoreError;
pub use orchestrator::{Conversation, TurnOrchestrator, TurnOutcome, TurnSettings};
pub use registry::to_function_tools;
pub use session::{McpLauncher, McpToolSession, bootstrap};
