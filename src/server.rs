use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    config::Config,
    handlers::{health, openapi, validate, validate_sse},
    services::validator::ValidatorCli,
};

/// Shared by every request; holds no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub validator: Arc<ValidatorCli>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let validator = ValidatorCli::new(&config);
        Self {
            config: Arc::new(config),
            validator: Arc::new(validator),
        }
    }
}

pub fn build_app(config: Config) -> Router {
    let body_limit = config.max_body_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(health))
        .route("/api/openapi.json", get(openapi))
        .route("/api/validate", post(validate))
        .route("/api/validate/sse", post(validate_sse))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(AppState::new(config))
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = config.addr();
    let app = build_app(config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
