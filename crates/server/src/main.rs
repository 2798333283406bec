use server::clients::anthropic::AnthropicClient;
use server::config::Config;
use server::routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use chess_core::proposer::{MoveProposer, NullProposer};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();

    // Pick the move proposer: the real LLM client when a key is configured,
    // otherwise the always-"no move" stub so the pipeline keeps working.
    let llm = config
        .anthropic_api_key
        .clone()
        .map(|key| Arc::new(AnthropicClient::new(&config, key)));
    let proposer: Arc<dyn MoveProposer> = match llm.clone() {
        Some(client) => {
            tracing::info!("LLM move proposer configured (model: {})", config.anthropic_model);
            client
        }
        None => {
            tracing::warn!("No API key configured - pieces will decline to move");
            Arc::new(NullProposer)
        }
    };
    let classifier = llm.filter(|_| config.classify_references);

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/chat", post(routes::chat::chat))
        .layer(Extension(config.clone()))
        .layer(Extension(proposer))
        .layer(Extension(classifier))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
