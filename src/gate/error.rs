//! Per-request error taxonomy
//!
//! Every variant maps to a plain-text HTTP response; nothing here escalates
//! beyond the request being handled.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors surfaced to the client while proxying a single request
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Request body is not a JSON object
    #[error("Invalid request body")]
    InvalidBody(#[source] serde_json::Error),

    /// `model` field absent, empty, or not a string
    #[error("Model field is required")]
    MissingModel,

    /// Logical model name has no route
    #[error("Model not found")]
    UnknownModel,

    /// Route resolves to an OpenAI-style upstream, which this handler refuses
    #[error("OpenAI models should use /chat/completions endpoint")]
    OpenAiRoute,

    /// Rewritten body could not be re-serialized
    #[error("Error modifying request")]
    Rewrite(#[source] serde_json::Error),

    /// Outbound call could not be completed at all
    #[error("Error forwarding request")]
    Upstream(#[source] reqwest::Error),
}

impl ProxyError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidBody(_)
            | ProxyError::MissingModel
            | ProxyError::UnknownModel
            | ProxyError::OpenAiRoute => StatusCode::BAD_REQUEST,
            ProxyError::Rewrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
