mod career;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::credentials::{CredentialSource, EnvCredentials, API_KEY_ENV};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (also loads .env into the process environment)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting WorkHub API v{}", env!("CARGO_PKG_VERSION"));

    // The key is re-read on every call; this is only an early hint for operators.
    let credentials = Arc::new(EnvCredentials);
    if credentials.api_key().is_some_and(|k| !k.trim().is_empty()) {
        info!("{API_KEY_ENV} found");
    } else {
        warn!("{API_KEY_ENV} is not set; AI features will fail until it is configured");
    }

    let llm = LlmClient::new(config.llm_settings(), credentials)
        .context("Failed to build HTTP client")?;
    info!(
        "LLM client initialized (models: {})",
        config.model_priority.join(" -> ")
    );

    let state = AppState {
        llm,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to APP_URL once the frontend is served from a fixed origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
