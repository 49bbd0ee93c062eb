//! Turn-level scenarios driven by a scripted model and an in-memory tool host.

use pretty_assertions::assert_eq;
use serde_json::json;
use sous_core::{
    Conversation, SousCoreError, TurnOrchestrator, TurnOutcome, TurnSettings, to_function_tools,
};
use sous_protocol::{ChatMessage, ContentBlock, Role, ToolCall, ToolDescriptor, ToolError, ToolOutput};
use sous_test_utils::{RecordingToolHost, ScriptedModel};
use std::sync::Arc;

fn orchestrator(model: &ScriptedModel) -> TurnOrchestrator {
    TurnOrchestrator::new(Arc::new(model.clone()), TurnSettings::default())
}

fn conversation(user: &str) -> Conversation {
    let mut conversation = Conversation::with_system("You are a recipe assistant.");
    conversation.push(ChatMessage::user(user));
    conversation
}

/// An empty pantry listing is folded back in and answered on the second step.
#[tokio::test]
async fn empty_pantry_is_answered_after_one_tool_call() {
    let descriptors = vec![ToolDescriptor::new("pantry_list_items").with_input_schema(json!({}))];
    let tools = to_function_tools(&descriptors);
    let model = ScriptedModel::new(vec![
        ChatMessage::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("pantry_list_items", json!({}))],
        ),
        ChatMessage::assistant("Your pantry is empty."),
    ]);
    let host = RecordingToolHost::new(descriptors)
        .with_output("pantry_list_items", ToolOutput::text("[]"));
    let mut conversation = conversation("What's in my pantry?");

    let outcome = orchestrator(&model)
        .run_turn(&mut conversation, &tools, &host)
        .await
        .expect("turn");

    assert_eq!(outcome, TurnOutcome::Answer("Your pantry is empty.".to_string()));
    assert_eq!(model.call_count(), 2);
    assert_eq!(host.calls().len(), 1);
    assert_eq!(model.seen_tools()[0], vec!["pantry_list_items".to_string()]);
    assert_eq!(tools[0].function.parameters, json!({}));

    let tool_message = &model.requests()[1][3];
    assert_eq!(tool_message.role, Role::Tool);
    assert_eq!(tool_message.name.as_deref(), Some("pantry_list_items"));
    let encoded: serde_json::Value = serde_json::from_str(&tool_message.content).expect("json");
    assert_eq!(encoded, json!([{ "type": "text", "text": "[]" }]));
}

/// Arguments sent as an encoded string reach the host as a keyed set.
#[tokio::test]
async fn string_encoded_arguments_are_decoded_before_dispatch() {
    let model = ScriptedModel::new(vec![
        ChatMessage::assistant_with_tool_calls(
            "",
            vec![ToolCall::new(
                "pantry_upsert_item",
                json!("{\"item\":{\"name\":\"milk\"}}"),
            )],
        ),
        ChatMessage::assistant("Added milk."),
    ]);
    let host = RecordingToolHost::default()
        .with_output("pantry_upsert_item", ToolOutput::Sequence(vec![ContentBlock::Text("ok".to_string())]));
    let mut conversation = conversation("Add milk");

    orchestrator(&model)
        .run_turn(&mut conversation, &[], &host)
        .await
        .expect("turn");

    let calls = host.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "pantry_upsert_item");
    assert_eq!(
        serde_json::Value::Object(calls[0].1.clone()),
        json!({ "item": { "name": "milk" } })
    );
}

/// A transport failure aborts the turn and keeps earlier messages intact.
#[tokio::test]
async fn transport_failure_aborts_and_preserves_history() {
    let requesting = ChatMessage::assistant_with_tool_calls(
        "Checking.",
        vec![
            ToolCall::new("recipes_search", json!({ "query": "soup" })),
            ToolCall::new("recipes_get", json!({ "recipe_id": "tomato-soup" })),
        ],
    );
    let model = ScriptedModel::new(vec![requesting.clone()]);
    let host = RecordingToolHost::default()
        .with_output("recipes_search", ToolOutput::text("[\"tomato-soup\"]"))
        .with_transport_failure("recipes_get", "connection reset");
    let mut conversation = conversation("Any soups?");
    let before = conversation.clone();

    let err = orchestrator(&model)
        .run_turn(&mut conversation, &[], &host)
        .await
        .unwrap_err();

    match err {
        SousCoreError::ToolInvocation { tool, source } => {
            assert_eq!(tool, "recipes_get");
            assert!(matches!(source, ToolError::Transport(message) if message == "connection reset"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let messages = conversation.messages();
    assert_eq!(messages.len(), before.len() + 2);
    assert_eq!(&messages[..before.len()], before.messages());
    assert_eq!(messages[before.len()], requesting);
    assert_eq!(messages[before.len() + 1].name.as_deref(), Some("recipes_search"));
}

/// The model is re-asked with the full history on every step.
#[tokio::test]
async fn each_step_sees_all_prior_messages() {
    let model = ScriptedModel::new(vec![
        ChatMessage::assistant_with_tool_calls("", vec![ToolCall::new("pantry_list_items", json!(null))]),
        ChatMessage::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("recipes_search", json!([["query", "rice"]]))],
        ),
        ChatMessage::assistant("Try fried rice."),
    ]);
    let host = RecordingToolHost::default();
    let mut conversation = conversation("Dinner idea?");

    let outcome = orchestrator(&model)
        .run_turn(&mut conversation, &[], &host)
        .await
        .expect("turn");

    assert_eq!(outcome.reply(), "Try fried rice.");
    let lengths: Vec<usize> = model.requests().iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![2, 4, 6]);
    assert_eq!(host.calls()[1].1.get("query"), Some(&json!("rice")));
    assert_eq!(conversation.len(), 7);
}
