//! Server binary for handscribe.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to a [`RelayConfig`] and serves the relay.

use anyhow::{Context, Result};
use clap::Parser;
use handscribe::{serve, AppState, OpenAiBackend, RelayConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Handwritten-text extraction relay.
///
/// Accepts image uploads on POST /extract-ocr and relays them to an
/// OpenAI-compatible vision model server.
#[derive(Parser, Debug)]
#[command(name = "handscribe-server", version, about)]
struct Args {
    /// Base URL of the OpenAI-compatible inference server (with /v1 prefix).
    #[arg(long, env = "HANDSCRIBE_ENDPOINT", default_value = "http://localhost:7979/v1")]
    endpoint: String,

    /// Model identifier sent with every completion request.
    #[arg(long, env = "HANDSCRIBE_MODEL", default_value = "Qwen3VL-2B-Instruct-Q4_K_M.gguf")]
    model: String,

    /// Bearer token for the inference server.
    #[arg(long, env = "HANDSCRIBE_API_KEY", default_value = "sk-no-key-required")]
    api_key: String,

    /// Address to bind the relay on.
    #[arg(long, env = "HANDSCRIBE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind the relay on.
    #[arg(long, env = "HANDSCRIBE_PORT", default_value_t = 8000)]
    port: u16,

    /// Maximum image dimension in pixels after preprocessing.
    #[arg(long, env = "HANDSCRIBE_MAX_IMAGE_DIM", default_value_t = 1024)]
    max_image_dim: u32,

    /// Per-call timeout for inference requests, in seconds (unset: none).
    #[arg(long, env = "HANDSCRIBE_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handscribe=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut builder = RelayConfig::builder()
        .endpoint(&args.endpoint)
        .model(&args.model)
        .api_key(&args.api_key)
        .max_image_dim(args.max_image_dim);
    if let Some(secs) = args.request_timeout_secs {
        builder = builder.request_timeout_secs(secs);
    }
    let config = builder.build().context("invalid relay configuration")?;

    tracing::info!("Inference endpoint: {}", config.endpoint);
    tracing::info!("Model: {}", config.model);

    let backend = OpenAiBackend::new(&config).context("failed to construct HTTP client")?;
    let state = AppState::new(config, Arc::new(backend));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.host, args.port))?;

    serve(addr, state).await.context("relay server failed")?;
    Ok(())
}
