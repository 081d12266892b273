//! Liveness probe

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

use crate::http::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub subscribers: usize,
}

pub fn create_health_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET /health
///
/// Always 200 while the process serves requests.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        subscribers: state.registry.len(),
    })
}
