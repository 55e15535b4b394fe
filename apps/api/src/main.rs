mod config;
mod cosmos;
mod errors;
mod extraction;
mod llm_client;
mod portfolio;
mod retry;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::cosmos::texture::TextureCache;
use crate::extraction::HttpExtractor;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Anti-Portfolio API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_model.clone())
        .context("failed to build LLM HTTP client")?;
    info!("LLM client initialized (model: {})", llm.model());

    // Initialize content extractor
    let extractor = HttpExtractor::new(config.web_scraping_timeout, config.pdf_extraction_timeout)
        .context("failed to build web extraction client")?;
    info!(
        "Content extractor initialized (web timeout: {:?}, pdf timeout: {:?})",
        config.web_scraping_timeout, config.pdf_extraction_timeout
    );

    let state = AppState {
        config: config.clone(),
        llm: Arc::new(llm),
        extractor: Arc::new(extractor),
        textures: Arc::new(TextureCache::new(config.texture_cache_bytes)),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
