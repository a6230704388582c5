//! Agent registry for the Truvo platform.
//!
//! CRUD over agent configuration records, plus [`resolve_config`], the
//! always-succeeding projection served to the external voice worker.
//!
//! Every function takes a borrowed [`rusqlite::Connection`] and performs a
//! single statement, so callers can run them on any pooled connection
//! without extra coordination.

mod config;

pub use config::resolve_config;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use truvo_types::{dedup_tools, format_timestamp, Agent, ToolId};

/// Errors that can occur during agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("agent not found: {0}")]
    NotFound(String),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The full editable field set of an agent.
///
/// Used for both creation and full-record replacement; there is no partial
/// update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentFields {
    pub name: String,
    pub system_prompt: String,
    pub voice_id: String,
    pub greeting: String,
    pub tools: Vec<ToolId>,
}

const AGENT_COLUMNS: &str =
    "id, name, system_prompt, voice_id, greeting, tools_json, created_at, updated_at";

/// Inserts a new agent and returns the stored record.
pub fn create_agent(conn: &Connection, fields: &AgentFields) -> Result<Agent, AgentError> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let now = format_timestamp(Utc::now());
    let tools = dedup_tools(fields.tools.iter().copied());
    let tools_json = serde_json::to_string(&tools)?;

    conn.execute(
        "INSERT INTO agents (
            id, name, system_prompt, voice_id, greeting, tools_json, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            id,
            fields.name,
            fields.system_prompt,
            fields.voice_id,
            fields.greeting,
            tools_json,
            now,
        ],
    )?;

    Ok(Agent {
        id,
        name: fields.name.clone(),
        system_prompt: fields.system_prompt.clone(),
        voice_id: fields.voice_id.clone(),
        greeting: fields.greeting.clone(),
        tools: Some(tools),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Retrieves an agent by ID.
pub fn get_agent(conn: &Connection, id: &str) -> Result<Agent, AgentError> {
    conn.query_row(
        &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?1"),
        [id],
        map_row_to_agent,
    )
    .optional()?
    .ok_or_else(|| AgentError::NotFound(id.to_string()))
}

/// Lists every agent, newest first.
pub fn list_agents(conn: &Connection) -> Result<Vec<Agent>, AgentError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AGENT_COLUMNS} FROM agents ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt.query_map([], map_row_to_agent)?;
    let mut agents = Vec::new();
    for row in rows {
        agents.push(row?);
    }
    Ok(agents)
}

/// Replaces every editable field of an agent and stamps `updated_at`.
///
/// Returns [`AgentError::NotFound`] if no row matched.
pub fn replace_agent(
    conn: &Connection,
    id: &str,
    fields: &AgentFields,
) -> Result<Agent, AgentError> {
    let now = format_timestamp(Utc::now());
    let tools_json = serde_json::to_string(&dedup_tools(fields.tools.iter().copied()))?;

    let updated = conn.execute(
        "UPDATE agents
         SET name = ?2, system_prompt = ?3, voice_id = ?4, greeting = ?5,
             tools_json = ?6, updated_at = ?7
         WHERE id = ?1",
        params![
            id,
            fields.name,
            fields.system_prompt,
            fields.voice_id,
            fields.greeting,
            tools_json,
            now,
        ],
    )?;

    if updated == 0 {
        return Err(AgentError::NotFound(id.to_string()));
    }

    get_agent(conn, id)
}

/// Deletes an agent. Unconditional: returns whether a row was removed, but
/// a missing agent is not an error. Call rows referencing it are untouched.
pub fn delete_agent(conn: &Connection, id: &str) -> Result<bool, AgentError> {
    let deleted = conn.execute("DELETE FROM agents WHERE id = ?1", [id])?;
    Ok(deleted > 0)
}

fn map_row_to_agent(row: &Row) -> rusqlite::Result<Agent> {
    let tools_json: Option<String> = row.get(5)?;
    let tools = match tools_json {
        Some(s) => Some(serde_json::from_str::<Vec<ToolId>>(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };

    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        system_prompt: row.get(2)?,
        voice_id: row.get(3)?,
        greeting: row.get(4)?,
        tools,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
