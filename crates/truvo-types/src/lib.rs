//! Shared types, error definitions, and constants for the Truvo platform.
//!
//! This crate provides the foundational types used across all Truvo crates:
//! the tool catalog, agent and call records, the configuration projection
//! handed to the voice worker, and the session lifecycle events reported by
//! the real-time media platform.
//!
//! No crate in the workspace depends on anything *except* `truvo-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

mod defaults;
mod event;
mod voice;

pub use defaults::AgentDefaults;
pub use event::{RoomInfo, SessionEvent};
pub use voice::{Voice, VOICES};

/// Identity prefix reserved for the voice-AI worker's participants.
///
/// Any participant whose identity starts with this prefix is the agent, not
/// the human caller.
pub const AGENT_IDENTITY_PREFIX: &str = "agent-";

/// Room name prefix used by the playground: `agent-<agentId>-<suffix>`.
pub const AGENT_ROOM_PREFIX: &str = "agent-";

/// Formats a timestamp the way every stored record does: RFC 3339, UTC,
/// microsecond precision. Strings in this format sort chronologically.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A capability the voice agent may invoke during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    /// Look up open tour slots for a date.
    CheckAvailability,
    /// Book a property tour.
    BookTour,
}

impl ToolId {
    /// Every tool in the catalog, in display order.
    pub const ALL: [ToolId; 2] = [ToolId::CheckAvailability, ToolId::BookTour];

    /// Returns the wire identifier for this tool.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckAvailability => "check_availability",
            Self::BookTour => "book_tour",
        }
    }

    /// Returns the description the worker registers with the language model.
    pub fn description(self) -> &'static str {
        match self {
            Self::CheckAvailability => {
                "Check available tour times for a specific date. Use this before booking to see what times are open."
            }
            Self::BookTour => {
                "Book a property tour appointment. Use this after confirming the date, time, and getting the visitor's name."
            }
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a catalog tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for ToolId {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolId::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| UnknownTool(s.to_string()))
    }
}

/// Collapses a tool list into an ordered set, keeping first occurrences.
pub fn dedup_tools(tools: impl IntoIterator<Item = ToolId>) -> Vec<ToolId> {
    let mut out: Vec<ToolId> = Vec::new();
    for tool in tools {
        if !out.contains(&tool) {
            out.push(tool);
        }
    }
    out
}

/// A configured voice-assistant persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Opaque identifier (32-char hex), immutable once assigned.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Instructions defining the assistant's persona and behavior.
    pub system_prompt: String,
    /// Text-to-speech voice identifier.
    pub voice_id: String,
    /// First utterance spoken when a session starts.
    pub greeting: String,
    /// Enabled tools. `None` when the stored column is null.
    pub tools: Option<Vec<ToolId>>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

/// The subset of an agent the voice worker needs at session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub system_prompt: String,
    pub greeting: String,
    pub voice_id: String,
    pub tools_enabled: Vec<ToolId>,
}

/// Speaker of a transcript utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptRole {
    User,
    Agent,
}

/// One speaker-tagged utterance in a call transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub text: String,
    pub timestamp: String,
}

/// One real-time session instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    /// Opaque identifier (32-char hex).
    pub id: String,
    /// Owning agent, when it could be resolved.
    pub agent_id: Option<String>,
    /// Name of the underlying real-time room. Not unique across calls.
    pub room_name: String,
    /// Start timestamp (RFC 3339).
    pub started_at: String,
    /// End timestamp; `None` while the call is in progress.
    pub ended_at: Option<String>,
    /// Whole seconds between room creation and finish.
    pub duration_seconds: Option<i64>,
    pub transcript: Option<Vec<TranscriptEntry>>,
    pub recording_url: Option<String>,
    /// Free-form key/value bag.
    pub metadata: Option<serde_json::Value>,
}

impl Call {
    /// Returns `true` once the end timestamp has been recorded.
    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }
}
