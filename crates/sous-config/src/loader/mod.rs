//! Layered configuration loader.
//!
//! Discovers config layers (user, project, cwd, repo, runtime), validates each
//! against the schema, merges them in precedence order, and produces the
//! effective `SousConfig`.

mod layer_io;
mod merge;
mod schema;
mod utils;

#[cfg(test)]
mod tests;

use crate::{ConfigError, SousConfig};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "sous.json5";
/// Default config directory under user or repo roots.
const DEFAULT_CONFIG_DIR: &str = ".sous";
/// Marker files/dirs that identify a project root.
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

/// Environment variable overriding `model.name`.
pub const ENV_MODEL: &str = "SOUS_MODEL";
/// Environment variable overriding `model.endpoint`.
pub const ENV_OLLAMA_URL: &str = "SOUS_OLLAMA_URL";
/// Environment variable overriding `store.path`.
pub const ENV_DB_PATH: &str = "SOUS_DB_PATH";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: SousConfig,
    /// Metadata for each layer merged into the effective config.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// User-specific configuration.
    User,
    /// Project root configuration.
    Project,
    /// Current working directory configuration.
    Cwd,
    /// Repo-local `.sous` configuration.
    Repo,
    /// Runtime overrides (highest precedence).
    Runtime,
}

/// Metadata about a merged config layer.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: Option<PathBuf>,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to resolve local layers.
    pub cwd: PathBuf,
    /// Optional user config path (defaults to `~/.sous/sous.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last.
    pub runtime_paths: Vec<PathBuf>,
    /// Marker files/dirs used to detect the project root.
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl SousConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config from path: {}", path.display());
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value = parse_json5(&contents, "config")?;
        config_from_value(value, "config")
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value = parse_json5(contents, "config")?;
        config_from_value(value, "config")
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations.
    ///
    /// Layer precedence (low -> high): user, project, cwd, repo, runtime.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = utils::normalize_path(&options.cwd)?;
        debug!("normalized cwd for config load: {}", cwd.display());
        let mut layers = Vec::new();
        let mut merge_layers = Vec::new();
        let mut seen_paths = HashSet::new();

        let mut candidates = Vec::new();
        if let Some(path) = options.user_config_path.as_ref() {
            candidates.push((ConfigLayerSource::User, path.clone()));
        }
        let project_root = utils::find_project_root(&cwd, &options.project_root_markers);
        match project_root.as_ref() {
            Some(root) => {
                debug!("resolved project root: {}", root.display());
                candidates.push((ConfigLayerSource::Project, root.join(DEFAULT_CONFIG_FILE)));
            }
            None => debug!("project root not found; skipping project/repo layers"),
        }
        candidates.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));
        if let Some(root) = project_root.as_ref() {
            candidates.push((
                ConfigLayerSource::Repo,
                root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
            ));
        }

        for (source, path) in candidates {
            if !seen_paths.insert(utils::unique_path(&path)) {
                debug!(
                    "skipping duplicate layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            if let Some(layer) = layer_io::load_optional_layer(source, &path)? {
                layers.push(layer.meta.clone());
                merge_layers.push(layer);
            }
        }

        for runtime_path in &options.runtime_paths {
            let loaded = layer_io::load_required_layer(ConfigLayerSource::Runtime, runtime_path)?;
            debug!("loaded runtime layer (path={})", runtime_path.display());
            layers.push(loaded.meta.clone());
            merge_layers.push(loaded);
        }

        let mut merged = Value::Object(serde_json::Map::new());
        for layer in merge_layers {
            merge::merge_json_values(&mut merged, &layer.value);
        }

        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Apply `SOUS_MODEL`, `SOUS_OLLAMA_URL`, and `SOUS_DB_PATH` from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides resolved through `lookup`, then re-validate.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(name) = lookup(ENV_MODEL) {
            debug!("model name overridden from environment (model={name})");
            self.model.name = name;
        }
        if let Some(endpoint) = lookup(ENV_OLLAMA_URL) {
            debug!("model endpoint overridden from environment (endpoint={endpoint})");
            self.model.endpoint = endpoint;
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!("store path overridden from environment (path={path})");
            self.store.path = path;
        }
        self.validate()
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.orchestrator.max_steps == 0 {
            return Err(ConfigError::ZeroStepCeiling);
        }
        if self.model.name.trim().is_empty() {
            return Err(ConfigError::EmptyModelField("model.name"));
        }
        if self.model.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyModelField("model.endpoint"));
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("model.timeout_secs"));
        }
        if self.tool_host.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("tool_host.timeout_secs"));
        }
        if let Some(command) = self.tool_host.command.as_deref()
            && command.trim().is_empty()
        {
            return Err(ConfigError::BlankToolHostCommand);
        }
        Ok(())
    }
}

/// Internal representation of a loaded config layer.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

fn parse_json5(contents: &str, layer: &str) -> Result<Value, ConfigError> {
    json5::from_str(contents).map_err(|source| ConfigError::Syntax {
        layer: layer.to_string(),
        source,
    })
}

fn config_from_value(value: Value, label: &str) -> Result<SousConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: SousConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
