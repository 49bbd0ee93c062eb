//! Sous command line: REPL, HTTP server, and the recipe tool server.

mod repl;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{LevelFilter, info, warn};
use sous_config::{ENV_DB_PATH, ENV_MODEL, ENV_OLLAMA_URL, LayeredConfigOptions, SousConfig};
use sous_core::session::DEFAULT_TOOL_SERVER_ARG;
use sous_core::{
    ChatService, McpLauncher, OllamaBackend, TurnOrchestrator, TurnSettings, bootstrap,
};
use sous_protocol::{ModelBackend, ToolHost};
use sous_store::SqliteStore;
use sous_tools::{recipe_tool_registry, serve_stdio};
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line options shared by every subcommand.
#[derive(Parser)]
#[command(name = "sous", version, about = "Tool-calling recipe assistant")]
struct Cli {
    /// Extra sous.json5 layer, applied last (repeatable)
    #[arg(long, global = true)]
    config: Vec<PathBuf>,
    /// Ollama model name
    #[arg(long, global = true)]
    model: Option<String>,
    /// Ollama chat endpoint
    #[arg(long, global = true)]
    ollama_url: Option<String>,
    /// SQLite database path
    #[arg(long, global = true)]
    db_path: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat on stdin/stdout (default)
    Chat,
    /// Serve the HTTP chat API and frontend
    Serve {
        /// Listen address
        #[arg(long)]
        bind: Option<String>,
        /// Directory holding index.html and static assets
        #[arg(long)]
        frontend_dir: Option<String>,
    },
    /// Run the pantry/recipe MCP server on stdio
    ToolServer,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stderr only; the tool server speaks MCP on stdout.
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    prepare_tool_host(&mut config, &cli.config);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(config).await,
        Command::Serve { bind, frontend_dir } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(frontend_dir) = frontend_dir {
                config.server.frontend_dir = frontend_dir;
            }
            run_serve(config).await
        }
        Command::ToolServer => run_tool_server(config).await,
    }
}

/// Layered files, then environment, then flags.
fn load_config(cli: &Cli) -> anyhow::Result<SousConfig> {
    let cwd = std::env::current_dir().context("cwd")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    for path in &cli.config {
        options = options.with_runtime_path(path);
    }
    let layered =
        SousConfig::load_layered_with_options(options).context("failed to load config")?;
    info!(
        "config loaded (cwd={}, layers={})",
        cwd.display(),
        layered.layers.len()
    );

    let mut config = layered.config;
    config
        .apply_env_overrides()
        .context("invalid environment override")?;
    config
        .apply_overrides_from(|key| match key {
            ENV_MODEL => cli.model.clone(),
            ENV_OLLAMA_URL => cli.ollama_url.clone(),
            ENV_DB_PATH => cli.db_path.clone(),
            _ => None,
        })
        .context("invalid command-line override")?;
    Ok(config)
}

/// Point the default tool host at this executable and the resolved store.
fn prepare_tool_host(config: &mut SousConfig, runtime_paths: &[PathBuf]) {
    if config.tool_host.command.is_some() {
        return;
    }
    if config.tool_host.args.is_empty() {
        let mut args = Vec::new();
        for path in runtime_paths {
            args.push("--config".to_string());
            args.push(path.display().to_string());
        }
        args.push(DEFAULT_TOOL_SERVER_ARG.to_string());
        config.tool_host.args = args;
    }
    let store_path = config.store.path.clone();
    config
        .tool_host
        .env
        .entry(ENV_DB_PATH.to_string())
        .or_insert(store_path);
}

fn model_backend(config: &SousConfig) -> anyhow::Result<Arc<dyn ModelBackend>> {
    let backend = OllamaBackend::new(&config.model).context("failed to build model client")?;
    info!(
        "model backend ready (model={}, endpoint={})",
        backend.model(),
        backend.endpoint()
    );
    Ok(Arc::new(backend))
}

async fn run_chat(config: SousConfig) -> anyhow::Result<()> {
    let model = model_backend(&config)?;
    let (session, tools) = bootstrap(&config.tool_host)
        .await
        .context("failed to start tool host")?;
    let orchestrator = TurnOrchestrator::new(model, TurnSettings::from(&config.orchestrator));
    let system_prompt = config.orchestrator.resolved_system_prompt();

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let result = repl::run_repl(
        &orchestrator,
        &session,
        &tools,
        &system_prompt,
        stdin.lock(),
        stdout.lock(),
    )
    .await;
    if let Err(err) = session.close().await {
        warn!("tool host close failed (error={err})");
    }
    result.map(|_| ())
}

async fn run_serve(config: SousConfig) -> anyhow::Result<()> {
    let model = model_backend(&config)?;
    let launcher = Arc::new(McpLauncher::new(config.tool_host.clone()));
    let chat = Arc::new(ChatService::from_config(&config, model, launcher));
    sous_server::serve(&config.server, chat)
        .await
        .context("http server failed")
}

async fn run_tool_server(config: SousConfig) -> anyhow::Result<()> {
    let store = SqliteStore::open(&config.store.path)
        .with_context(|| format!("failed to open store at {}", config.store.path))?;
    info!("store opened (path={})", config.store.path);
    serve_stdio(recipe_tool_registry(Arc::new(store)))
        .await
        .context("tool server failed")
}
