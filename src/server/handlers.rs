//! Request handlers for the task endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use super::{ApiError, AppState};
use crate::types::{ScheduleRequest, ScheduleResponse, StatusResponse};

/// `POST /tasks/schedule`
///
/// Results can later be fetched either through the returned presigned
/// `task_results_url` or by polling `/tasks/{task_id}/status`.
pub async fn schedule_task(
    State(state): State<AppState>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let response = state.service.schedule(request).await?;
    Ok(Json(response))
}

/// `GET /tasks/{task_id}/status`
///
/// For computation-heavy jobs prefer the presigned URL — its contents are
/// served by the store and stay gzip-encoded. Never fails: unknown ids and
/// store hiccups both report `NOT_STARTED`.
pub async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Json<StatusResponse> {
    Json(state.service.status(&task_id).await)
}

/// `GET /status` — deployment info for smoke checks.
pub async fn service_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "VERSION": env!("CARGO_PKG_VERSION"),
        "ENV_NAME": state.settings.env_name,
        "BUCKET": state.settings.jobs_bucket,
        "QUEUE": state.settings.jobs_queue_name,
    }))
}
