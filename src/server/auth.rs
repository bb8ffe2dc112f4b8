//! API-key header check applied to every route.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::AppState;

/// Rejects requests whose key header is absent or wrong with `403`.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(state.settings.api_key_header.as_str())
        .and_then(|value| value.to_str().ok());

    if provided == Some(state.settings.api_key.as_str()) {
        next.run(request).await
    } else {
        (
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "Not authenticated"})),
        )
            .into_response()
    }
}
