//! llmp binary
//!
//! Reverse proxy for OpenAI- and Anthropic-compatible LLM APIs

use anyhow::{Context, Result};
use clap::Parser;
use llmp::gate::server::start_server;
use llmp::{Config, GatewayState};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// llmp: unified LLM proxy
#[derive(Parser, Debug)]
#[command(name = "llmp")]
#[command(about = "Reverse proxy for OpenAI- and Anthropic-compatible LLM APIs", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let state = GatewayState::new(&config)?;
    info!("Loaded {} models from config", state.routes.len());

    start_server(state).await
}
