//! HTTP front door for the Sous chat service.

pub mod error;
pub mod http;

pub use error::{ApiError, ServerError};
pub use http::{AppState, ChatRequest, ChatResponse, router, serve};
