//! Line-oriented chat loop.

use log::error;
use sous_core::{Conversation, TurnOrchestrator};
use sous_protocol::{ChatMessage, FunctionTool, ToolHost};
use std::io::{BufRead, Write};

/// Read user lines from `input` until a blank line or end of input.
///
/// History is kept across turns. A failed turn is reported and its
/// partial messages are discarded so the next turn starts clean.
pub async fn run_repl<R, W>(
    orchestrator: &TurnOrchestrator,
    host: &dyn ToolHost,
    tools: &[FunctionTool],
    system_prompt: &str,
    mut input: R,
    mut output: W,
) -> anyhow::Result<Conversation>
where
    R: BufRead,
    W: Write,
{
    let mut conversation = Conversation::with_system(system_prompt);
    loop {
        write!(output, "You: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            writeln!(output, "Goodbye.")?;
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            writeln!(output, "Goodbye.")?;
            break;
        }

        let checkpoint = conversation.len();
        conversation.push(ChatMessage::user(text));
        match orchestrator.run_turn(&mut conversation, tools, host).await {
            Ok(outcome) => writeln!(output, "\nAssistant: {}\n", outcome.reply())?,
            Err(err) => {
                error!("turn failed (error={err})");
                conversation.truncate(checkpoint);
                writeln!(output, "\nError: {err}\n")?;
            }
        }
    }
    Ok(conversation)
}

#[cfg(test)]
mod tests {
    use super::run_repl;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sous_core::{TurnOrchestrator, TurnSettings};
    use sous_protocol::{ChatMessage, Role, ToolCall};
    use sous_test_utils::{RecordingToolHost, ScriptedModel};
    use std::io::Cursor;
    use std::sync::Arc;

    fn orchestrator(model: &ScriptedModel) -> TurnOrchestrator {
        TurnOrchestrator::new(Arc::new(model.clone()), TurnSettings::default())
    }

    #[tokio::test]
    async fn keeps_history_across_turns_and_stops_on_blank_line() {
        let model = ScriptedModel::new(vec![
            ChatMessage::assistant("Hello!"),
            ChatMessage::assistant("Still here."),
        ]);
        let host = RecordingToolHost::default();
        let mut output = Vec::new();

        let conversation = run_repl(
            &orchestrator(&model),
            &host,
            &[],
            "system",
            Cursor::new("hi\nanyone?\n\nignored\n"),
            &mut output,
        )
        .await
        .expect("repl");

        let printed = String::from_utf8(output).expect("utf8");
        assert_eq!(
            printed,
            "You: \nAssistant: Hello!\n\nYou: \nAssistant: Still here.\n\nYou: Goodbye.\n"
        );
        assert_eq!(model.call_count(), 2);
        assert_eq!(model.requests()[1].len(), 4);
        assert_eq!(conversation.len(), 5);
    }

    #[tokio::test]
    async fn end_of_input_says_goodbye() {
        let model = ScriptedModel::new(Vec::new());
        let mut output = Vec::new();
        run_repl(
            &orchestrator(&model),
            &RecordingToolHost::default(),
            &[],
            "system",
            Cursor::new(""),
            &mut output,
        )
        .await
        .expect("repl");
        assert_eq!(String::from_utf8(output).expect("utf8"), "You: \nGoodbye.\n");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_turn_is_reported_and_rolled_back() {
        let model = ScriptedModel::new(vec![
            ChatMessage::assistant_with_tool_calls(
                "",
                vec![ToolCall::new("pantry_list_items", json!({}))],
            ),
            ChatMessage::assistant("Recovered."),
        ]);
        let host = RecordingToolHost::default()
            .with_transport_failure("pantry_list_items", "pipe closed");
        let mut output = Vec::new();

        let conversation = run_repl(
            &orchestrator(&model),
            &host,
            &[],
            "system",
            Cursor::new("what do I have?\nhello\n"),
            &mut output,
        )
        .await
        .expect("repl");

        let printed = String::from_utf8(output).expect("utf8");
        assert!(printed.contains("Error: tool pantry_list_items failed"), "{printed}");
        assert!(printed.contains("Assistant: Recovered."), "{printed}");
        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(conversation.messages()[1], ChatMessage::user("hello"));
    }
}
