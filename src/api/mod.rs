// src/api/mod.rs — HTTP API for submitting and polling optimization tasks

pub mod auth;
pub mod handlers;
pub mod types;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::core::orchestrator::Orchestrator;
use crate::infra::config::ApiConfig;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Orchestrator,
    pub token: Option<String>,
}

impl ApiState {
    pub fn new(orchestrator: Orchestrator, config: &ApiConfig) -> Self {
        Self {
            orchestrator,
            token: config.token.clone().filter(|t| !t.is_empty()),
        }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/optimize", post(handlers::optimize))
        .route("/status/{task_id}", get(handlers::get_status))
        .route("/tasks", get(handlers::list_tasks))
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Serve the API until Ctrl-C. In-flight loops are abandoned on exit.
pub async fn start_server(config: &ApiConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API server listening on http://{addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
            }
        })
        .await?;
    Ok(())
}
