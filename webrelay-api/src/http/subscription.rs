//! Subscriber management endpoints
//!
//! POST /subscribe and POST /unsubscribe take `{"url": "..."}`;
//! GET /subscriber lists the registered URLs in ascending order.

use axum::{
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use webrelay_core::{AddOutcome, RemoveOutcome};

use crate::http::{read_body, AppError, AppResult, AppState};

/// Body of a subscribe or unsubscribe request
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub url: String,
}

/// A body that reads but does not decode is the client's fault (400).
fn decode_request(body: Result<Bytes, BytesRejection>) -> AppResult<SubscriptionRequest> {
    let bytes = read_body(body)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Register a callback URL
///
/// POST /subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<StatusCode> {
    let request = decode_request(body)?;

    match state.registry.add(&request.url) {
        AddOutcome::Added => {
            info!(url = %request.url, "Subscriber registered");
            Ok(StatusCode::OK)
        }
        AddOutcome::AlreadyPresent => Err(AppError::forbidden("URL is already registered")),
        AddOutcome::Invalid(reason) => Err(webrelay_core::Error::from(reason).into()),
    }
}

/// Deregister a callback URL
///
/// POST /unsubscribe
pub async fn unsubscribe(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<StatusCode> {
    let request = decode_request(body)?;

    match state.registry.remove(&request.url) {
        RemoveOutcome::Removed => {
            info!(url = %request.url, "Subscriber deregistered");
            Ok(StatusCode::OK)
        }
        RemoveOutcome::NotFound => Err(AppError::not_found("URL is not registered")),
    }
}

/// List registered callback URLs
///
/// GET /subscriber
pub async fn list_subscribers(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.registry.list())
}
