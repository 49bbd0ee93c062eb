//! Stateless chat entry point shared by the HTTP adapter.
//!
//! Each reply launches a fresh tool host session, runs one turn over the
//! caller's history, and tears the session down again.

use crate::error::SousCoreError;
use crate::orchestrator::{Conversation, TurnOrchestrator, TurnSettings};
use crate::registry::to_function_tools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use sous_config::SousConfig;
use sous_protocol::{ChatMessage, ModelBackend, ToolHostLauncher};
use std::sync::Arc;

/// Roles a client may put in a history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// One client-supplied history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Assistant,
            content: content.into(),
        }
    }

    fn to_chat_message(&self) -> ChatMessage {
        match self.role {
            HistoryRole::User => ChatMessage::user(self.content.clone()),
            HistoryRole::Assistant => ChatMessage::assistant(self.content.clone()),
        }
    }
}

/// Answers a full history with one orchestrated turn.
#[derive(Clone)]
pub struct ChatService {
    orchestrator: TurnOrchestrator,
    launcher: Arc<dyn ToolHostLauncher>,
    system_prompt: String,
}

impl ChatService {
    pub fn new(
        orchestrator: TurnOrchestrator,
        launcher: Arc<dyn ToolHostLauncher>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            launcher,
            system_prompt: system_prompt.into(),
        }
    }

    /// Build a service from loaded configuration.
    pub fn from_config(
        config: &SousConfig,
        model: Arc<dyn ModelBackend>,
        launcher: Arc<dyn ToolHostLauncher>,
    ) -> Self {
        let settings = TurnSettings::from(&config.orchestrator);
        Self::new(
            TurnOrchestrator::new(model, settings),
            launcher,
            config.orchestrator.resolved_system_prompt(),
        )
    }

    /// Reply to `history`, which is prefixed with the system prompt.
    ///
    /// The tool host session is closed whether or not the turn succeeds.
    pub async fn reply(&self, history: &[HistoryMessage]) -> Result<String, SousCoreError> {
        let host = self
            .launcher
            .launch()
            .await
            .map_err(SousCoreError::Bootstrap)?;

        let descriptors = match host.list_tools().await {
            Ok(descriptors) => descriptors,
            Err(err) => {
                if let Err(close_err) = host.close().await {
                    warn!("tool host close failed (error={close_err})");
                }
                return Err(SousCoreError::Bootstrap(err));
            }
        };
        let tools = to_function_tools(&descriptors);

        let mut conversation = Conversation::with_system(self.system_prompt.clone());
        for message in history {
            conversation.push(message.to_chat_message());
        }
        info!(
            "chat request (history={}, tools={})",
            history.len(),
            tools.len()
        );

        let outcome = self
            .orchestrator
            .run_turn(&mut conversation, &tools, host.as_ref())
            .await;
        if let Err(close_err) = host.close().await {
            warn!("tool host close failed (error={close_err})");
        }
        Ok(outcome?.reply().to_string())
    }
}
