//! Error types for the orchestration crate.

use crate::arguments::MalformedArguments;
use sous_protocol::{ModelError, ToolError};
use thiserror::Error;

/// Errors that abort a turn.
///
/// Exhausting the step budget is not an error; see `TurnOutcome`.
#[derive(Debug, Error)]
pub enum SousCoreError {
    /// A tool call carried arguments that could not be decoded.
    #[error("malformed arguments for tool {tool}: {source}")]
    MalformedArguments {
        tool: String,
        #[source]
        source: MalformedArguments,
    },
    /// The tool host failed while executing a call.
    #[error("tool {tool} failed: {source}")]
    ToolInvocation {
        tool: String,
        #[source]
        source: ToolError,
    },
    /// The model backend failed.
    #[error("model backend error: {0}")]
    ModelBackend(#[from] ModelError),
    /// The tool host session could not be established.
    #[error("tool host bootstrap failed: {0}")]
    Bootstrap(#[source] ToolError),
}
