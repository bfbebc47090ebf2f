//! Liveness endpoints.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub const ROOT_TEXT: &str = "notification relay is running";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

async fn root() -> &'static str {
    ROOT_TEXT
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "notification-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "queue": state.config.queue_name,
    }))
}
