mod chat_response;
mod handlers;
mod query_payload;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use docchat::{ChatSession, Config, FileValidator, OpenAiService};
use handlers::*;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

// Room for multipart framing so oversized files still reach the validator.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

fn app(session: AppState, max_upload_bytes: u64) -> Router {
    let body_limit = usize::try_from(max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/upload", post(handle_upload))
        .route("/query", post(handle_query))
        .route("/conversation", get(handle_conversation))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(session)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().context("Failed to load configuration")?;
    log::info!("Starting with {:?}", config);

    let session = Arc::new(ChatSession::new(
        OpenAiService::new(&config),
        FileValidator::new(config.max_upload_bytes),
    ));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app(session, config.max_upload_bytes)).await?;
    Ok(())
}
