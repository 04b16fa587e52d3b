// src/api/handlers.rs

use crate::api::{auth, types::*, ApiState};
use crate::core::types::{Task, TaskSummary};
use crate::infra::errors::PerfTuneError;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// POST /optimize: Register a task and start optimizing in the background.
pub async fn optimize(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    auth::check_auth(&state, &headers)?;

    match state.orchestrator.submit(body.into()) {
        Ok(task_id) => Ok(Json(OptimizeResponse { task_id })),
        Err(e @ PerfTuneError::InvalidRequest(_)) => {
            Err(error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => {
            tracing::error!("Failed to submit task: {e}");
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// GET /status/{task_id}: Consistent snapshot of one task.
pub async fn get_status(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    auth::check_auth(&state, &headers)?;

    state
        .orchestrator
        .get_status(&task_id)
        .map(Json)
        .map_err(|e| error(StatusCode::NOT_FOUND, e.to_string()))
}

/// GET /tasks: Summaries of every task this process knows about.
pub async fn list_tasks(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TaskSummary>>, ApiError> {
    auth::check_auth(&state, &headers)?;
    Ok(Json(state.orchestrator.registry().list()))
}

/// GET /health: Simple health check.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
