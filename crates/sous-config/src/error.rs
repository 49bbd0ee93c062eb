//! Failures raised while assembling a `SousConfig`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer file exists (or was named explicitly) but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A layer is not well-formed JSON5.
    #[error("{layer} is not valid JSON5: {source}")]
    Syntax {
        layer: String,
        #[source]
        source: json5::Error,
    },
    /// A key that passed the schema could not be mapped onto the settings model.
    #[error("config does not fit the settings model: {0}")]
    Shape(#[from] serde_json::Error),
    /// A layer names an unknown key or holds a value of the wrong kind.
    #[error("invalid config at {layer}:{key}: {reason}")]
    Schema {
        layer: String,
        key: String,
        reason: String,
    },
    #[error("orchestrator.max_steps must be at least 1")]
    ZeroStepCeiling,
    /// `model.name` or `model.endpoint` is blank.
    #[error("{0} must not be empty")]
    EmptyModelField(&'static str),
    /// `model.timeout_secs` or `tool_host.timeout_secs` is zero.
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("tool_host.command is set but blank")]
    BlankToolHostCommand,
}
