//! Chat message shapes for the model backend calling convention.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Speaker role for a conversation message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// User-authored message.
    User,
    /// Model-authored message, possibly carrying tool calls.
    Assistant,
    /// Result of a tool invocation.
    Tool,
}

/// One message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role that produced the message.
    pub role: Role,
    /// Text content; may be empty (e.g. an assistant message that only calls tools).
    #[serde(default, deserialize_with = "nullable_string")]
    pub content: String,
    /// Tool calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Tool name, set on tool-role messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// Build a plain assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Build an assistant message requesting tool calls.
    pub fn assistant_with_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Some(calls),
            name: None,
        }
    }

    /// Build a tool-role message carrying an encoded tool result.
    pub fn tool(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: None,
            name: Some(name.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            name: None,
        }
    }

    /// Tool calls carried by this message; empty when there are none.
    pub fn requested_tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

/// One model-issued request to invoke a named tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Backend-assigned call id, when the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Function name and raw arguments.
    #[serde(default)]
    pub function: FunctionCall,
}

impl ToolCall {
    /// Build a tool call for `name` with raw `arguments`.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: None,
            function: FunctionCall {
                name: Some(name.into()),
                arguments,
            },
        }
    }
}

/// Function name plus raw argument payload, exactly as emitted by the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    /// Tool name; models occasionally omit it.
    #[serde(default)]
    pub name: Option<String>,
    /// Arguments as an object, an encoded string, or anything else the model sent.
    #[serde(default)]
    pub arguments: Value,
}

/// Function declaration in the model backend's tool format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionTool {
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Declared function.
    pub function: FunctionDeclaration,
}

impl FunctionTool {
    /// Build a `{type: "function"}` declaration.
    pub fn function(declaration: FunctionDeclaration) -> Self {
        Self {
            kind: "function".to_string(),
            function: declaration,
        }
    }
}

/// Name, description, and JSON schema of a callable function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
