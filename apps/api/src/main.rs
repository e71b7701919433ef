mod config;
mod csv;
mod errors;
mod llm;
mod pdf;
mod pipeline;
mod registry;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm::{ChatModel, LlmClient};
use crate::pipeline::engine::JobEngine;
use crate::registry::FileRegistry;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("matchrank_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MatchRank API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the LLM backend; without a key the pipeline runs on the
    // deterministic heuristic alone.
    let model: Option<Arc<dyn ChatModel>> = match &config.openai_api_key {
        Some(key) => {
            let client = LlmClient::new(
                key.clone(),
                config.llm_base_url.clone(),
                config.model.clone(),
            )?;
            info!("LLM client initialized (model: {})", client.model());
            Some(Arc::new(client))
        }
        None => {
            warn!("OPENAI_API_KEY not set - using heuristic fallback only");
            None
        }
    };

    // Build app state: registry for uploads, engine for job processing
    let registry = Arc::new(FileRegistry::new());
    let engine = Arc::new(JobEngine::new(registry.clone(), model));
    let state = AppState {
        registry,
        engine,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
