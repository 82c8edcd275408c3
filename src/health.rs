use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::state::AppState;

/// DB health endpoint: returns 200 OK when the line-item store answers a
/// ping, otherwise 503 Service Unavailable.
pub async fn db_health(State(state): State<AppState>) -> impl IntoResponse {
	match state.line_items.ping().await {
		Ok(()) => (StatusCode::OK, "OK").into_response(),
		Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("db error: {}", e)).into_response(),
	}
}

/// Prometheus metrics endpoint: returns metrics in Prometheus text format
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
	(StatusCode::OK, state.metrics.encode()).into_response()
}
