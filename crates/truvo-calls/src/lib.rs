//! Call ledger for the Truvo platform.
//!
//! A call row is opened when the first human joins a room (or when a client
//! creates one explicitly) and finalized when the platform reports that the
//! room finished. [`reconcile`] maps platform lifecycle events onto those
//! two mutations.
//!
//! Calls are never deleted here, and `agent_id` is not checked against the
//! agent registry.

mod reconcile;

pub use reconcile::{reconcile, Reconciliation};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use truvo_types::{format_timestamp, Call, TranscriptEntry};

/// Page size used when the caller does not supply one.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Errors that can occur during call ledger operations.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("call not found: {0}")]
    NotFound(String),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parameters for opening a call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCall {
    pub agent_id: Option<String>,
    pub room_name: String,
    pub metadata: Option<serde_json::Value>,
}

/// The joined agent name, shaped as `{"name": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRef {
    pub name: String,
}

/// A call together with the name of its agent, if that agent still exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallWithAgent {
    #[serde(flatten)]
    pub call: Call,
    pub agents: Option<AgentRef>,
}

/// Filter for [`list_calls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFilter {
    /// Restrict to one agent's calls.
    pub agent_id: Option<String>,
    /// Maximum rows to return. Not capped; a negative value means no limit.
    pub limit: i64,
}

impl Default for CallFilter {
    fn default() -> Self {
        Self {
            agent_id: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

const CALL_COLUMNS: &str = "c.id, c.agent_id, c.room_name, c.started_at, c.ended_at,
    c.duration_seconds, c.transcript_json, c.recording_url, c.metadata_json";

/// Opens a new call that started at `started_at`.
pub fn create_call(
    conn: &Connection,
    new: &NewCall,
    started_at: DateTime<Utc>,
) -> Result<Call, CallError> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let started_at = format_timestamp(started_at);
    let metadata_json = new
        .metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO calls (id, agent_id, room_name, started_at, metadata_json)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, new.agent_id, new.room_name, started_at, metadata_json],
    )?;

    Ok(Call {
        id,
        agent_id: new.agent_id.clone(),
        room_name: new.room_name.clone(),
        started_at,
        ended_at: None,
        duration_seconds: None,
        transcript: None,
        recording_url: None,
        metadata: new.metadata.clone(),
    })
}

/// Retrieves a call by ID.
pub fn get_call(conn: &Connection, id: &str) -> Result<Call, CallError> {
    conn.query_row(
        &format!("SELECT {CALL_COLUMNS} FROM calls c WHERE c.id = ?1"),
        [id],
        map_row_to_call,
    )
    .optional()?
    .ok_or_else(|| CallError::NotFound(id.to_string()))
}

/// Lists calls newest first, joined with their agent's name.
pub fn list_calls(conn: &Connection, filter: &CallFilter) -> Result<Vec<CallWithAgent>, CallError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CALL_COLUMNS}, a.name
         FROM calls c
         LEFT JOIN agents a ON a.id = c.agent_id
         WHERE (?1 IS NULL OR c.agent_id = ?1)
         ORDER BY c.started_at DESC, c.rowid DESC
         LIMIT ?2"
    ))?;

    let rows = stmt.query_map(params![filter.agent_id, filter.limit], |row| {
        let agent_name: Option<String> = row.get(9)?;
        Ok(CallWithAgent {
            call: map_row_to_call(row)?,
            agents: agent_name.map(|name| AgentRef { name }),
        })
    })?;

    let mut calls = Vec::new();
    for row in rows {
        calls.push(row?);
    }
    Ok(calls)
}

/// Records the end of the most recent open call in `room_name`.
///
/// `ended_at` and `duration_seconds` are written together in one statement
/// whose predicate requires `ended_at IS NULL`, so repeated deliveries for
/// the same room are no-ops. Returns the finalized call's ID, or `None` when
/// the room has no open call.
pub fn finish_open_call(
    conn: &Connection,
    room_name: &str,
    ended_at: DateTime<Utc>,
    duration_seconds: Option<i64>,
) -> Result<Option<String>, CallError> {
    let id = conn
        .query_row(
            "UPDATE calls
             SET ended_at = ?2, duration_seconds = ?3
             WHERE id = (
                 SELECT id FROM calls
                 WHERE room_name = ?1 AND ended_at IS NULL
                 ORDER BY started_at DESC, rowid DESC
                 LIMIT 1
             )
             RETURNING id",
            params![room_name, format_timestamp(ended_at), duration_seconds],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(id)
}

fn json_column<T: serde::de::DeserializeOwned>(
    row: &Row,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        serde_json::from_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    })
    .transpose()
}

fn map_row_to_call(row: &Row) -> rusqlite::Result<Call> {
    let transcript: Option<Vec<TranscriptEntry>> = json_column(row, 6)?;
    let metadata: Option<serde_json::Value> = json_column(row, 8)?;

    Ok(Call {
        id: row.get(0)?,
        agent_id: row.get(1)?,
        room_name: row.get(2)?,
        started_at: row.get(3)?,
        ended_at: row.get(4)?,
        duration_seconds: row.get(5)?,
        transcript,
        recording_url: row.get(7)?,
        metadata,
    })
}
