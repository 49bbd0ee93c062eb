//! Routes for the chat endpoint and the static frontend.

use crate::error::{ApiError, ServerError};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use sous_config::ServerConfig;
use sous_core::{ChatService, HistoryMessage};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::Level;

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub frontend_dir: PathBuf,
}

impl AppState {
    pub fn new(chat: Arc<ChatService>, frontend_dir: impl Into<PathBuf>) -> Self {
        Self {
            chat,
            frontend_dir: frontend_dir.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub content: String,
}

pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.frontend_dir.clone());
    Router::new()
        .route("/", get(index))
        .route("/api/chat", post(chat))
        .nest_service("/static", static_files)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)),
        )
        .with_state(state)
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    if request.messages.is_empty() {
        return Err(ApiError::InvalidRequest(
            "messages must contain at least one message".to_string(),
        ));
    }
    info!("chat request received (messages={})", request.messages.len());
    match state.chat.reply(&request.messages).await {
        Ok(content) => Ok(Json(ChatResponse { content })),
        Err(err) => {
            error!("chat failed (error={err})");
            Err(ApiError::ChatFailed(err.to_string()))
        }
    }
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let path = state.frontend_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Ok(Html(html)),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(ApiError::FrontendMissing),
        Err(err) => Err(ApiError::Internal(format!(
            "failed to read {}: {err}",
            path.display()
        ))),
    }
}

/// Bind `config.bind` and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, chat: Arc<ChatService>) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind.clone(),
            source,
        })?;
    info!(
        "http server listening (addr={}, frontend_dir={})",
        config.bind, config.frontend_dir
    );
    let app = router(AppState::new(chat, &config.frontend_dir));
    axum::serve(listener, app).await?;
    Ok(())
}
