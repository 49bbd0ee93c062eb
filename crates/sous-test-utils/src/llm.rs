use async_trait::async_trait;
use parking_lot::Mutex;
use sous_protocol::{ChatMessage, FunctionTool, ModelBackend, ModelError};
use std::collections::VecDeque;
use std::sync::Arc;

/// Model backend replaying a fixed script of assistant messages.
///
/// Every request is recorded. Once the script runs out the model either
/// repeats its fallback message or fails.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    script: Arc<Mutex<VecDeque<ChatMessage>>>,
    fallback: Option<ChatMessage>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    seen_tools: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<ChatMessage>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            ..Self::default()
        }
    }

    /// A model that answers every request with `message`.
    pub fn repeating(message: ChatMessage) -> Self {
        Self {
            fallback: Some(message),
            ..Self::default()
        }
    }

    /// Number of chat requests received so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Conversation snapshots, one per request.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }

    /// Tool names declared on each request.
    pub fn seen_tools(&self) -> Vec<Vec<String>> {
        self.seen_tools.lock().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedModel {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[FunctionTool],
    ) -> Result<ChatMessage, ModelError> {
        self.requests.lock().push(messages.to_vec());
        self.seen_tools.lock().push(
            tools
                .iter()
                .map(|tool| tool.function.name.clone())
                .collect(),
        );
        if let Some(next) = self.script.lock().pop_front() {
            return Ok(next);
        }
        self.fallback
            .clone()
            .ok_or_else(|| ModelError::Request("script exhausted".to_string()))
    }
}

/// Model backend whose every call fails with the given HTTP status.
#[derive(Debug, Clone)]
pub struct FailingModel {
    status: u16,
}

impl FailingModel {
    pub fn new(status: u16) -> Self {
        Self { status }
    }
}

#[async_trait]
impl ModelBackend for FailingModel {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _tools: &[FunctionTool],
    ) -> Result<ChatMessage, ModelError> {
        Err(ModelError::Status {
            status: self.status,
            body: "model unavailable".to_string(),
        })
    }
}
