//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::io;
use thiserror::Error;

pub const FRONTEND_MISSING: &str = "Frontend not found. Create frontend/index.html";

/// Errors surfaced to HTTP clients as `{"detail": ...}` bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Chat failed: {0}")]
    ChatFailed(String),
    #[error("Frontend not found. Create frontend/index.html")]
    FrontendMissing,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ChatFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::FrontendMissing => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// Errors starting or running the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}
