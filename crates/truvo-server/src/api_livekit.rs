//! Playground token issuance.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for `POST /api/livekit/token`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub room_name: Option<String>,
    pub participant_name: Option<String>,
    /// Agent the room belongs to. When set, the room is pre-created with
    /// that agent recorded in its metadata.
    pub agent_id: Option<String>,
}

/// Response body for `POST /api/livekit/token`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub ws_url: String,
}

/// Handler for `POST /api/livekit/token`.
pub async fn create_token_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = payload?;
    let room_name = request.room_name.filter(|s| !s.is_empty());
    let participant = request.participant_name.filter(|s| !s.is_empty());
    let (Some(room_name), Some(participant)) = (room_name, participant) else {
        return Err(ApiError::BadRequest(
            "roomName and participantName are required".to_string(),
        ));
    };

    if let Some(agent_id) = request.agent_id.filter(|s| !s.is_empty()) {
        if state.voice_service.is_enabled() {
            // Best effort: the room is created on first join anyway, just
            // without the agent tag.
            let limit = state.voice_service.room_create_timeout();
            match tokio::time::timeout(
                limit,
                state.voice_service.create_agent_room(&room_name, &agent_id),
            )
            .await
            {
                Ok(Ok(sid)) => {
                    tracing::info!(room = %room_name, %agent_id, %sid, "created agent room")
                }
                Ok(Err(e)) => tracing::warn!(
                    room = %room_name,
                    %agent_id,
                    error = %e,
                    "failed to pre-create agent room"
                ),
                Err(_) => tracing::warn!(
                    room = %room_name,
                    %agent_id,
                    timeout_ms = limit.as_millis() as u64,
                    "timed out pre-creating agent room"
                ),
            }
        }
    }

    let token = state
        .voice_service
        .generate_join_token(&room_name, &participant)
        .map_err(|e| {
            tracing::error!(room = %room_name, error = %e, "failed to generate LiveKit token");
            ApiError::InternalServerError("Failed to generate token".to_string())
        })?;

    Ok(Json(TokenResponse {
        token,
        ws_url: state.voice_service.get_url().to_string(),
    }))
}
