//! Ollama `/api/chat` model backend.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sous_config::ModelConfig;
use sous_protocol::{ChatMessage, FunctionTool, ModelBackend, ModelError};
use std::time::Duration;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: &'a [ChatMessage],
    tools: &'a [FunctionTool],
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Non-streaming client for an Ollama-style chat endpoint.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ModelError::Request(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.name.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[FunctionTool],
    ) -> Result<ChatMessage, ModelError> {
        let request = ChatRequest {
            model: &self.model,
            stream: false,
            messages,
            tools,
        };
        debug!(
            "sending chat request (model={}, messages={}, tools={})",
            self.model,
            messages.len(),
            tools.len()
        );
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| ModelError::Request(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ModelError::Request(err.to_string()))?;
        if !status.is_success() {
            warn!(
                "model backend rejected request (status={}, body={})",
                status.as_u16(),
                body
            );
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let decoded: ChatResponse =
            serde_json::from_str(&body).map_err(|err| ModelError::Decode(err.to_string()))?;
        Ok(decoded.message)
    }
}

#[cfg(test)]
mod tests {
    use super::OllamaBackend;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use sous_config::ModelConfig;
    use sous_protocol::{
        ChatMessage, FunctionDeclaration, FunctionTool, ModelBackend, ModelError, Role,
    };
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<Value>>>;

    async fn spawn_endpoint(status: StatusCode, reply: Value) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route(
                "/api/chat",
                post(
                    move |State(captured): State<Captured>, Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            captured.lock().expect("lock").push(body);
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}/api/chat"), captured)
    }

    fn backend(endpoint: String) -> OllamaBackend {
        OllamaBackend::new(&ModelConfig {
            name: "llama3.1".to_string(),
            endpoint,
            timeout_secs: 5,
        })
        .expect("backend")
    }

    #[tokio::test]
    async fn sends_non_streaming_request_with_tools() {
        let (endpoint, captured) = spawn_endpoint(
            StatusCode::OK,
            json!({
                "model": "llama3.1",
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [
                        { "function": { "name": "pantry_list_items", "arguments": {} } }
                    ]
                },
                "done": true
            }),
        )
        .await;
        let tools = vec![FunctionTool::function(FunctionDeclaration {
            name: "pantry_list_items".to_string(),
            description: "List pantry items".to_string(),
            parameters: json!({ "type": "object", "properties": {} }),
        })];

        let reply = backend(endpoint)
            .chat(&[ChatMessage::user("what do I have?")], &tools)
            .await
            .expect("reply");

        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.requested_tool_calls().len(), 1);
        assert_eq!(
            reply.requested_tool_calls()[0].function.name.as_deref(),
            Some("pantry_list_items")
        );

        let requests = captured.lock().expect("lock").clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["model"], json!("llama3.1"));
        assert_eq!(requests[0]["stream"], json!(false));
        assert_eq!(requests[0]["messages"][0]["role"], json!("user"));
        assert_eq!(requests[0]["tools"][0]["type"], json!("function"));
        assert_eq!(
            requests[0]["tools"][0]["function"]["name"],
            json!("pantry_list_items")
        );
    }

    #[tokio::test]
    async fn null_content_decodes_as_empty() {
        let (endpoint, _) = spawn_endpoint(
            StatusCode::OK,
            json!({ "message": { "role": "assistant", "content": null } }),
        )
        .await;
        let reply = backend(endpoint)
            .chat(&[ChatMessage::user("hi")], &[])
            .await
            .expect("reply");
        assert_eq!(reply.content, "");
        assert!(reply.requested_tool_calls().is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let (endpoint, _) = spawn_endpoint(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "model not loaded" }),
        )
        .await;
        let err = backend(endpoint)
            .chat(&[ChatMessage::user("hi")], &[])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "model backend returned HTTP 500");
        match err {
            ModelError::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("model not loaded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn body_without_message_is_a_decode_error() {
        let (endpoint, _) = spawn_endpoint(StatusCode::OK, json!({ "done": true })).await;
        let err = backend(endpoint)
            .chat(&[ChatMessage::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_error() {
        let err = backend("http://127.0.0.1:9/api/chat".to_string())
            .chat(&[ChatMessage::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Request(_)));
    }
}
