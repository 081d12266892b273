//! Publication endpoint
//!
//! POST /publish forwards the raw request body to every subscriber.

use axum::{
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
};
use bytes::Bytes;

use crate::http::{read_body, AppError, AppResult, AppState};

/// Broadcast the request body to all subscribers
///
/// POST /publish
///
/// The body is forwarded unchanged and declared as `application/json`
/// downstream. Responds 409 with the unreachable subscribers if any delivery
/// failed. The fan-out runs on its own task so a publisher that disconnects
/// does not cancel deliveries already under way.
pub async fn publish(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<StatusCode> {
    let payload = read_body(body)?;

    let fanout = state.fanout.clone();
    let report = tokio::spawn(async move { fanout.publish(payload).await })
        .await
        .map_err(|e| {
            tracing::error!("Publication task failed: {}", e);
            AppError::internal_server_error("Publication aborted")
        })?;

    if report.is_success() {
        Ok(StatusCode::OK)
    } else {
        Err(AppError::delivery_failed(report.failed))
    }
}
