//! Encode tool outputs into the text placed in tool-role messages.

use serde_json::{Value, json};
use sous_protocol::{ContentBlock, ToolOutput};

/// Default length of log previews.
pub const PREVIEW_LEN: usize = 120;

/// Encode a tool output as JSON text. Total over every output shape.
pub fn encode_tool_output(output: &ToolOutput) -> String {
    match output {
        ToolOutput::Null => "{}".to_string(),
        ToolOutput::Scalar(value) => value.to_string(),
        ToolOutput::Sequence(blocks) => {
            Value::Array(blocks.iter().map(block_to_value).collect()).to_string()
        }
        ToolOutput::Keyed(map) => Value::Object(map.clone()).to_string(),
    }
}

fn block_to_value(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text(text) => json!({ "type": "text", "text": text }),
        ContentBlock::Opaque(raw) => Value::String(raw.to_string()),
    }
}

/// Short single-line summary of a tool output for logs.
pub fn preview_tool_output(output: &ToolOutput, max_len: usize) -> String {
    match output {
        ToolOutput::Null => "null".to_string(),
        ToolOutput::Sequence(blocks) if blocks.is_empty() => "[]".to_string(),
        ToolOutput::Sequence(blocks) => {
            let first = match &blocks[0] {
                ContentBlock::Text(text) => text.clone(),
                ContentBlock::Opaque(raw) => raw.to_string(),
            };
            format!("[{} item(s)] {}", blocks.len(), truncate(&first, max_len))
        }
        ToolOutput::Scalar(Value::String(text)) => truncate(text, max_len),
        ToolOutput::Scalar(value) => truncate(&value.to_string(), max_len),
        ToolOutput::Keyed(map) => truncate(&Value::Object(map.clone()).to_string(), max_len),
    }
}

fn truncate(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
