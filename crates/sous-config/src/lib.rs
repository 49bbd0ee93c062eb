//! Configuration models and layered config loading.
//!
//! This crate owns the Sous config schema, validation, and layer-merging
//! logic used by the CLI, the HTTP server, and the tool server.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{
    ConfigLayer, ConfigLayerSource, ENV_DB_PATH, ENV_MODEL, ENV_OLLAMA_URL, LayeredConfig,
    LayeredConfigOptions,
};
/// Configuration schema models.
pub use model::*;
