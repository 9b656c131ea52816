//! Admin HTTP endpoint: health probe and Prometheus metrics.

use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use tower_http::trace::TraceLayer;

use ingestd_core::metrics::REGISTRY;

/// Builds the admin router.
pub fn router() -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics() -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
