// Module: http
// HTTP/JSON API: subscriber management and publication fan-out

pub mod error;
pub mod health;
pub mod publish;
pub mod subscription;

use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use webrelay_core::{FanOut, SubscriberRegistry};

pub use error::{AppError, AppResult, ErrorResponse};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SubscriberRegistry>,
    pub fanout: Arc<FanOut>,
}

impl AppState {
    /// Build state around a fan-out; the registry is the one it delivers from.
    pub fn new(fanout: Arc<FanOut>) -> Self {
        Self {
            registry: fanout.registry().clone(),
            fanout,
        }
    }
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        // Health check endpoints (for monitoring probes)
        .merge(health::create_health_router())
        // Subscriber management
        .route("/subscribe", post(subscription::subscribe))
        .route("/unsubscribe", post(subscription::unsubscribe))
        .route("/subscriber", get(subscription::list_subscribers))
        // Fan-out
        .route("/publish", post(publish::publish))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Unwrap a raw request body.
///
/// A body that cannot be read (including one over the size limit) is a
/// server-side failure and maps to 500.
pub(crate) fn read_body(body: Result<Bytes, BytesRejection>) -> AppResult<Bytes> {
    body.map_err(|rejection| {
        tracing::warn!(status = %rejection.status(), "Failed to read request body: {}", rejection.body_text());
        AppError::internal_server_error(rejection.body_text())
    })
}
