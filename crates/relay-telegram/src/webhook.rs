//! Extra HTTP routes served next to the webhook endpoint.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

/// Liveness probe for the webhook server.
pub fn health_router() -> Router {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
