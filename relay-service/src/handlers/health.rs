use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "relay-service",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.text_provider.model(),
        "lore_source": state.lore.source().kind(),
        "lore_loaded": state.lore.is_loaded(),
    }))
}

/// Readiness probe: the generation provider must be configured.
///
/// Lore is loaded lazily, so it does not gate readiness.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.text_provider.health_check() {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unavailable",
                "error": e.to_string()
            })),
        ),
    }
}
