//! Real-time platform webhook receiver.

use crate::api::{run_blocking, ApiError};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::Extension,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use truvo_calls::reconcile;

const PROCESSING_FAILED: &str = "Webhook processing failed";

/// Handler for `POST /api/webhooks/livekit`.
///
/// The body must be read raw: the signature covers its exact bytes.
pub async fn livekit_webhook_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let Some(authorization) = headers.get(AUTHORIZATION) else {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    };
    // Receipt time anchors the call's end and duration.
    let received_at = Utc::now();

    let authorization = authorization.to_str().map_err(|e| {
        tracing::error!(error = %e, "webhook authorization header is not valid text");
        ApiError::InternalServerError(PROCESSING_FAILED.to_string())
    })?;
    // A body that is not UTF-8 cannot carry a valid event.
    let body = std::str::from_utf8(&body).map_err(|e| {
        tracing::error!(error = %e, "webhook body is not valid UTF-8");
        ApiError::InternalServerError(PROCESSING_FAILED.to_string())
    })?;
    let event = state
        .voice_service
        .verify_webhook(body, authorization)
        .map_err(|e| {
            tracing::error!(error = %e, "webhook verification failed");
            ApiError::InternalServerError(PROCESSING_FAILED.to_string())
        })?;

    tracing::debug!(event = event.kind(), "webhook verified");

    let outcome = run_blocking(PROCESSING_FAILED, move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "no database connection for webhook");
            ApiError::InternalServerError(PROCESSING_FAILED.to_string())
        })?;
        reconcile(&conn, &event, received_at).map_err(|e| {
            tracing::error!(event = event.kind(), error = %e, "failed to apply webhook event");
            ApiError::InternalServerError(PROCESSING_FAILED.to_string())
        })
    })
    .await?;

    tracing::debug!(?outcome, "webhook applied");
    Ok(Json(json!({ "received": true })))
}
