//! Test helpers shared across Sous crates.

pub mod fixtures;
pub mod llm;
pub mod tools;

pub use fixtures::pantry_tool_descriptors;
pub use llm::{FailingModel, ScriptedModel};
pub use tools::{FailingLauncher, RecordingToolHost, StaticLauncher};
