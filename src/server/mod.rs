//! HTTP surface: router assembly and shared request state.
//!
//! A thin layer over [`TaskService`](crate::service::TaskService): routes
//! live under the configured API prefix, every route sits behind the
//! API-key middleware, and tower-http provides request tracing and CORS.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::error::HubError;
use crate::service::TaskService;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Submission/status application service.
    pub service: Arc<TaskService>,
    /// Process settings (API key, prefix, service info).
    pub settings: Arc<Settings>,
}

/// Error envelope returned by the API.
///
/// Backend failures on the submission path surface as `400` (distinct
/// from the `422` a malformed body produces); status reads never error at
/// all — they degrade inside the service.
pub struct ApiError(pub HubError);

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HubError::InvalidParams(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = Json(json!({
            "error_code": status.as_u16(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Builds the API router for the given state.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/tasks/schedule", post(handlers::schedule_task))
        .route("/tasks/{task_id}/status", get(handlers::task_status))
        .route("/status", get(handlers::service_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .nest(&state.settings.api_prefix, api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
