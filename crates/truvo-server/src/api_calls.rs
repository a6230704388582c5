//! Call ledger handlers.

use crate::api::{internal, run_blocking, ApiError};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use truvo_calls::{create_call, list_calls, CallFilter, CallWithAgent, NewCall, DEFAULT_LIST_LIMIT};
use truvo_types::Call;

/// Query parameters for `GET /api/calls`.
#[derive(Debug, Deserialize)]
pub struct ListCallsQuery {
    pub agent_id: Option<String>,
    pub limit: Option<i64>,
}

/// Request body for `POST /api/calls`.
#[derive(Debug, Deserialize)]
pub struct CreateCallRequest {
    pub room_name: Option<String>,
    pub agent_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Handler for `GET /api/calls`.
pub async fn list_calls_handler(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<ListCallsQuery>, QueryRejection>,
) -> Result<Json<Vec<CallWithAgent>>, ApiError> {
    const MSG: &str = "Failed to fetch calls";
    let Query(query) = query?;
    let filter = CallFilter {
        agent_id: query.agent_id.filter(|id| !id.is_empty()),
        limit: query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
    };

    let calls = run_blocking(MSG, move || {
        let conn = state.pool.get().map_err(internal(MSG))?;
        list_calls(&conn, &filter).map_err(internal(MSG))
    })
    .await?;

    Ok(Json(calls))
}

/// Handler for `POST /api/calls`.
pub async fn create_call_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<CreateCallRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Call>), ApiError> {
    const MSG: &str = "Failed to create call";
    let Json(request) = payload?;
    let Some(room_name) = request.room_name.filter(|r| !r.is_empty()) else {
        return Err(ApiError::BadRequest("room_name is required".to_string()));
    };

    let new = NewCall {
        agent_id: request.agent_id,
        room_name,
        metadata: request.metadata,
    };
    let call = run_blocking(MSG, move || {
        let conn = state.pool.get().map_err(internal(MSG))?;
        create_call(&conn, &new, Utc::now()).map_err(internal(MSG))
    })
    .await?;

    tracing::info!(call_id = %call.id, room = %call.room_name, "call created");
    Ok((StatusCode::CREATED, Json(call)))
}
