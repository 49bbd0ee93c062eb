//! Model backend seam.

use crate::chat::{ChatMessage, FunctionTool};
use async_trait::async_trait;

/// Errors returned by a model backend call.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The request could not be sent or no response arrived.
    #[error("model request failed: {0}")]
    Request(String),
    /// The backend answered with a non-success status. `body` is kept for
    /// logs and stays out of the message.
    #[error("model backend returned HTTP {status}")]
    Status { status: u16, body: String },
    /// The response body could not be decoded.
    #[error("model response decode failed: {0}")]
    Decode(String),
}

/// A language model that answers a conversation, optionally requesting tools.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Ask for the next assistant message. Never streams.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[FunctionTool],
    ) -> Result<ChatMessage, ModelError>;
}
