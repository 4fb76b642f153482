use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

/// Reports poll freshness and listener count.
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let service = state.service();
    let last_refreshed = service.last_refreshed().await;

    Json(json!({
        "status": if last_refreshed.is_some() { "ok" } else { "starting" },
        "lastRefreshed": last_refreshed,
        "pollIntervalSecs": state.config().poll_interval.as_secs(),
        "subscribers": service.bus().subscriber_count(),
    }))
}

/// Lightweight ping, no state access.
async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
