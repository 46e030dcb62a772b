//! HTTP front door: OpenAI-compatible routes over the streaming driver

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::{config::ModelEntry, error::Result, services::streaming::StreamingDriver};

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub driver: StreamingDriver,
    pub models: Arc<Vec<ModelEntry>>,
}

impl AppState {
    #[must_use]
    pub fn new(driver: StreamingDriver, models: Vec<ModelEntry>) -> Self {
        Self {
            driver,
            models: Arc::new(models),
        }
    }
}

/// Create the API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/models", get(handlers::list_models))
        .route("/v1/chat/completions", post(handlers::chat_completions))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until the process receives Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails
pub async fn run_server(state: AppState, addr: &str) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}/", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
