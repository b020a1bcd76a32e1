//! Unified reverse proxy for OpenAI- and Anthropic-compatible LLM APIs.
//!
//! Clients address logical model names; a static routing table maps each to a
//! concrete upstream (base URL, API key, provider-qualified model id). The
//! gateway authenticates against a single shared token, rewrites the `model`
//! field of the request body, and relays the upstream response back to the
//! client, line by line for streamed completions.

pub mod config;
pub mod gate;

use thiserror::Error;

/// Result type for llmp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for llmp operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub use config::{Config, LitellmParams, ModelConfig, ProviderType, Route, RouteTable};
pub use gate::handlers::GatewayState;
pub use gate::server::start_server;
