//! Agent registry handlers, including the worker config endpoint.

use crate::api::{internal, run_blocking, ApiError};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use truvo_agents::{
    create_agent, delete_agent, get_agent, list_agents, replace_agent, resolve_config, AgentError,
    AgentFields,
};
use truvo_types::{Agent, AgentConfig, AgentDefaults, ToolId};

/// Request body for `POST /api/agents`.
///
/// Only `name` and `system_prompt` are required. Omitted or empty voice
/// and greeting, and omitted tools, take the configured defaults.
#[derive(Debug, Deserialize)]
pub struct CreateAgentRequest {
    pub name: Option<String>,
    pub system_prompt: Option<String>,
    pub voice_id: Option<String>,
    pub greeting: Option<String>,
    pub tools: Option<Vec<ToolId>>,
}

impl CreateAgentRequest {
    fn into_fields(self, defaults: &AgentDefaults) -> Result<AgentFields, ApiError> {
        // Only the empty string counts as missing; whitespace is kept as sent.
        let name = self.name.filter(|s| !s.is_empty());
        let system_prompt = self.system_prompt.filter(|s| !s.is_empty());
        let (Some(name), Some(system_prompt)) = (name, system_prompt) else {
            return Err(ApiError::BadRequest(
                "Name and system_prompt are required".to_string(),
            ));
        };

        Ok(AgentFields {
            name,
            system_prompt,
            voice_id: self
                .voice_id
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| defaults.voice_id.clone()),
            greeting: self
                .greeting
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| defaults.greeting.clone()),
            tools: self.tools.unwrap_or_else(|| defaults.tools.clone()),
        })
    }
}

/// Handler for `GET /api/agents`.
pub async fn list_agents_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Agent>>, ApiError> {
    const MSG: &str = "Failed to fetch agents";
    let agents = run_blocking(MSG, move || {
        let conn = state.pool.get().map_err(internal(MSG))?;
        list_agents(&conn).map_err(internal(MSG))
    })
    .await?;

    Ok(Json(agents))
}

/// Handler for `POST /api/agents`.
pub async fn create_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<CreateAgentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Agent>), ApiError> {
    const MSG: &str = "Failed to create agent";
    let Json(request) = payload?;
    let fields = request.into_fields(&state.defaults)?;

    let agent = run_blocking(MSG, move || {
        let conn = state.pool.get().map_err(internal(MSG))?;
        create_agent(&conn, &fields).map_err(internal(MSG))
    })
    .await?;

    tracing::info!(agent_id = %agent.id, name = %agent.name, "agent created");
    Ok((StatusCode::CREATED, Json(agent)))
}

/// Handler for `GET /api/agents/{id}`.
pub async fn get_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, ApiError> {
    const MSG: &str = "Failed to fetch agent";
    let agent = run_blocking(MSG, move || {
        let conn = state.pool.get().map_err(internal(MSG))?;
        get_agent(&conn, &id).map_err(|e| match e {
            AgentError::NotFound(_) => ApiError::NotFound("Agent not found".to_string()),
            other => internal(MSG)(other),
        })
    })
    .await?;

    Ok(Json(agent))
}

/// Handler for `PUT /api/agents/{id}`.
///
/// Full replace: every field must be present. An unknown id is reported
/// as an update failure, not a 404.
pub async fn replace_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<AgentFields>, JsonRejection>,
) -> Result<Json<Agent>, ApiError> {
    const MSG: &str = "Failed to update agent";
    let Json(fields) = payload?;

    let agent = run_blocking(MSG, move || {
        let conn = state.pool.get().map_err(internal(MSG))?;
        replace_agent(&conn, &id, &fields).map_err(internal(MSG))
    })
    .await?;

    tracing::info!(agent_id = %agent.id, "agent updated");
    Ok(Json(agent))
}

/// Handler for `DELETE /api/agents/{id}`.
pub async fn delete_agent_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    const MSG: &str = "Failed to delete agent";
    let agent_id = id.clone();
    let existed = run_blocking(MSG, move || {
        let conn = state.pool.get().map_err(internal(MSG))?;
        delete_agent(&conn, &agent_id).map_err(internal(MSG))
    })
    .await?;

    tracing::info!(agent_id = %id, existed, "agent deleted");
    Ok(Json(json!({ "success": true })))
}

/// Handler for `GET /api/agents/{id}/config`.
///
/// Called by the voice worker at session start. Always 200: any failure
/// serves the fallback configuration.
pub async fn get_agent_config_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<AgentConfig> {
    let defaults = Arc::clone(&state.defaults);
    let result = tokio::task::spawn_blocking(move || match state.pool.get() {
        Ok(conn) => resolve_config(&conn, &id, &state.defaults),
        Err(e) => {
            tracing::warn!(error = %e, agent_id = %id, "no database connection, serving fallback config");
            state.defaults.fallback_config()
        }
    })
    .await;

    match result {
        Ok(config) => Json(config),
        Err(e) => {
            tracing::warn!(error = %e, "config lookup task failed, serving fallback config");
            Json(defaults.fallback_config())
        }
    }
}
