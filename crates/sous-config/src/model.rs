//! Configuration schema for Sous.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prompt used when the config does not provide one.
pub const DEFAULT_SYSTEM_PROMPT: &str = concat!(
    "You are a recipe assistant. Use tools when the user asks about pantry or recipes. ",
    "Prefer searching local recipes before inventing.\n",
    "\n",
    "*** YOUR REPLY MUST BE PLAIN TEXT ONLY ***\n",
    "Never in your reply: no function/tool names (e.g. pantry_upsert_items, recipes_search), no JSON, no code, ",
    "no 'I will use the following tools', no 'Here is the JSON', no numbered steps of what you will do, ",
    "no 'To answer your request I will...', no describing how you will call tools. ",
    "Just do the actions (using the tools silently) and then write a short, natural answer with the result. ",
    "Example: User says 'add 2 sausages and suggest a recipe'. You reply only something like: ",
    "'Done. I added 2 sausages to your pantry. Here's a recipe you could try: [recipe name and brief summary].' ",
    "Never say what tools you used or show any technical details.\n",
    "\n",
    "IMPORTANT: When the user asks for multiple actions (e.g. add X then suggest a recipe), do ALL of them in order, then reply once with the outcome. ",
    "SOURCE OF TRUTH: Only the tools know the current pantry and recipes. Always use the list-pantry and search/get-recipe tools when suggesting recipes; never use old chat or memory.\n",
    "\n",
    "Tool usage: Use the tools to list/add/remove pantry items and to search or get recipes. Use multiple tools in sequence when needed. ",
    "When listing pantry items, report only what the list tool returns."
);

/// Root config for Sous.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SousConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub tool_host: ToolHostConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl SousConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> SousConfigBuilder {
        SousConfigBuilder::new()
    }
}

/// Builder for assembling a `SousConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct SousConfigBuilder {
    config: SousConfig,
}

impl SousConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: SousConfig::default(),
        }
    }

    /// Replace the model backend configuration.
    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    /// Replace the orchestrator configuration.
    pub fn orchestrator(mut self, orchestrator: OrchestratorConfig) -> Self {
        self.config.orchestrator = orchestrator;
        self
    }

    /// Replace the tool host launch configuration.
    pub fn tool_host(mut self, tool_host: ToolHostConfig) -> Self {
        self.config.tool_host = tool_host;
        self
    }

    /// Replace the store configuration.
    pub fn store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    /// Replace the HTTP server configuration.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Finalize and return the built `SousConfig`.
    pub fn build(self) -> SousConfig {
        self.config
    }
}

/// Model backend (Ollama chat endpoint) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_model_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            endpoint: default_model_endpoint(),
            timeout_secs: default_model_timeout_secs(),
        }
    }
}

fn default_model_name() -> String {
    "llama3.1".to_string()
}

fn default_model_endpoint() -> String {
    "http://localhost:11434/api/chat".to_string()
}

fn default_model_timeout_secs() -> u64 {
    120
}

/// Turn orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Hard ceiling on model round trips per turn.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Replaces the built-in system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Appended to the resolved system prompt.
    #[serde(default)]
    pub append_system_prompt: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            system_prompt: None,
            append_system_prompt: None,
        }
    }
}

impl OrchestratorConfig {
    /// System prompt after applying the override and the append section.
    pub fn resolved_system_prompt(&self) -> String {
        let mut prompt = self
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        if let Some(extra) = self
            .append_system_prompt
            .as_deref()
            .filter(|extra| !extra.trim().is_empty())
        {
            prompt.push_str("\n\n");
            prompt.push_str(extra.trim());
        }
        prompt
    }
}

fn default_max_steps() -> usize {
    20
}

/// How to spawn the MCP tool host process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolHostConfig {
    /// Executable to spawn; `None` re-runs the current binary as `tool-server`.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolHostConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
            timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_tool_timeout_secs() -> u64 {
    180
}

/// Recipe and pantry store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "data/recipes.db".to_string()
}

/// HTTP front door configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            frontend_dir: default_frontend_dir(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_frontend_dir() -> String {
    "frontend".to_string()
}
