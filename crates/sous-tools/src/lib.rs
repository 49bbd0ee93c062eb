//! Pantry and recipe tools, plus the MCP server that exposes them.

pub mod recipes;
pub mod registry;
pub mod server;
pub mod tool;

/// Recipe tool registry and registration helper.
pub use recipes::{recipe_tool_registry, register_recipe_tools};
/// Tool registry type.
pub use registry::ToolRegistry;
/// MCP stdio server.
pub use server::{RecipeToolServer, serve_stdio};
/// Tool trait and spec type.
pub use tool::{Tool, ToolSpec};
