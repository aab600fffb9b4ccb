//! Observability HTTP Routes

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use super::book_routes::LibraryState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check route at the root
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// Metrics route, nested under `/observability`
pub fn observability_routes(state: Arc<LibraryState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

async fn metrics_handler(State(state): State<Arc<LibraryState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.inventory.metrics().snapshot()))
}
