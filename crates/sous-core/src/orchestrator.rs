//! Bounded model/tool loop for one conversational turn.

use crate::arguments::normalize_arguments;
use crate::encoding::{PREVIEW_LEN, encode_tool_output, preview_tool_output};
use crate::error::SousCoreError;
use log::{debug, error, info, warn};
use sous_config::OrchestratorConfig;
use sous_protocol::{ChatMessage, FunctionTool, ModelBackend, ToolCall, ToolHost};
use std::sync::Arc;
use uuid::Uuid;

/// Default ceiling on model round trips per turn.
pub const DEFAULT_MAX_STEPS: usize = 20;
/// Reply used when the model answers with blank content.
pub const NO_CONTENT_REPLY: &str = "(no content)";
/// Reply used when the step ceiling is reached.
pub const EXHAUSTED_REPLY: &str = "(stopped after too many tool steps)";

/// Append-only message history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Start a conversation with a system message.
    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(prompt)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Drop every message after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }
}

/// How a turn ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model produced a final answer.
    Answer(String),
    /// The step ceiling was reached while the model kept requesting tools.
    StepBudgetExhausted { steps: usize, fallback: String },
}

impl TurnOutcome {
    /// Text to show the user.
    pub fn reply(&self) -> &str {
        match self {
            TurnOutcome::Answer(text) => text,
            TurnOutcome::StepBudgetExhausted { fallback, .. } => fallback,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, TurnOutcome::StepBudgetExhausted { .. })
    }
}

/// Knobs for the turn loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSettings {
    pub max_steps: usize,
    pub no_content_reply: String,
    pub exhausted_reply: String,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            no_content_reply: NO_CONTENT_REPLY.to_string(),
            exhausted_reply: EXHAUSTED_REPLY.to_string(),
        }
    }
}

impl TurnSettings {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

impl From<&OrchestratorConfig> for TurnSettings {
    fn from(config: &OrchestratorConfig) -> Self {
        TurnSettings::default().with_max_steps(config.max_steps)
    }
}

/// Drives one turn: model call, tool calls, repeat, until an answer or the ceiling.
#[derive(Clone)]
pub struct TurnOrchestrator {
    model: Arc<dyn ModelBackend>,
    settings: TurnSettings,
}

impl TurnOrchestrator {
    pub fn new(model: Arc<dyn ModelBackend>, settings: TurnSettings) -> Self {
        Self { model, settings }
    }

    /// Run one turn against `conversation`, which must already end with the
    /// user's message.
    ///
    /// Every assistant message that requests tools is appended verbatim,
    /// followed by one tool message per named call, in request order, before
    /// the model is asked again. A final answer is appended as an assistant
    /// message. On error the messages appended so far are left in place.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        tools: &[FunctionTool],
        host: &dyn ToolHost,
    ) -> Result<TurnOutcome, SousCoreError> {
        let turn_id = Uuid::new_v4();
        info!(
            "turn started (turn_id={}, messages={}, tools={}, max_steps={})",
            turn_id,
            conversation.len(),
            tools.len(),
            self.settings.max_steps
        );

        for step in 0..self.settings.max_steps {
            debug!("model request (turn_id={turn_id}, step={step})");
            let reply = self
                .model
                .chat(conversation.messages(), tools)
                .await
                .map_err(|err| {
                    error!("model request failed (turn_id={turn_id}, step={step}, error={err})");
                    SousCoreError::ModelBackend(err)
                })?;

            let calls: Vec<ToolCall> = reply.requested_tool_calls().to_vec();
            if calls.is_empty() {
                let content = reply.content.trim();
                let answer = if content.is_empty() {
                    self.settings.no_content_reply.clone()
                } else {
                    content.to_string()
                };
                conversation.push(ChatMessage::assistant(answer.clone()));
                info!(
                    "turn finished (turn_id={}, steps={}, reply_len={})",
                    turn_id,
                    step + 1,
                    answer.len()
                );
                return Ok(TurnOutcome::Answer(answer));
            }

            debug!(
                "model requested tools (turn_id={}, step={}, calls={})",
                turn_id,
                step,
                calls.len()
            );
            conversation.push(reply);
            for call in &calls {
                self.execute_call(turn_id, call, conversation, host).await?;
            }
        }

        warn!(
            "turn stopped at step ceiling (turn_id={}, max_steps={})",
            turn_id, self.settings.max_steps
        );
        Ok(TurnOutcome::StepBudgetExhausted {
            steps: self.settings.max_steps,
            fallback: self.settings.exhausted_reply.clone(),
        })
    }

    async fn execute_call(
        &self,
        turn_id: Uuid,
        call: &ToolCall,
        conversation: &mut Conversation,
        host: &dyn ToolHost,
    ) -> Result<(), SousCoreError> {
        let label = call.function.name.as_deref().unwrap_or("");
        let arguments = normalize_arguments(&call.function.arguments).map_err(|source| {
            error!("malformed tool arguments (turn_id={turn_id}, tool={label}, error={source})");
            SousCoreError::MalformedArguments {
                tool: label.to_string(),
                source,
            }
        })?;

        let Some(name) = call
            .function
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
        else {
            warn!("skipping tool call without a name (turn_id={turn_id})");
            return Ok(());
        };

        info!(
            "tool call (turn_id={}, tool={}, args={})",
            turn_id,
            name,
            serde_json::to_string(&arguments).unwrap_or_default()
        );

        let output = host.call_tool(name, arguments).await.map_err(|source| {
            error!("tool call failed (turn_id={turn_id}, tool={name}, error={source})");
            SousCoreError::ToolInvocation {
                tool: name.to_string(),
                source,
            }
        })?;
        info!(
            "tool result (turn_id={}, tool={}, result={})",
            turn_id,
            name,
            preview_tool_output(&output, PREVIEW_LEN)
        );

        conversation.push(ChatMessage::tool(name, encode_tool_output(&output)));
        Ok(())
    }
}
