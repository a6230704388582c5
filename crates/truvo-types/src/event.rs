//! Session lifecycle events reported by the real-time media platform.
//!
//! The platform-specific webhook payload is translated into a
//! [`SessionEvent`] once signature verification succeeds, so the call
//! ledger never depends on the platform's wire types.

use crate::AGENT_ROOM_PREFIX;
use serde::Deserialize;

/// The room a lifecycle event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoomInfo {
    pub name: String,
    /// Room creation time in Unix seconds, when the platform reported one.
    pub creation_time: Option<i64>,
    /// Opaque room metadata string set at room creation.
    pub metadata: Option<String>,
}

#[derive(Deserialize)]
struct RoomMetadata {
    agent_id: Option<String>,
}

impl RoomInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Resolves the agent that owns this room.
    ///
    /// A structured `{"agent_id": ...}` metadata document wins; otherwise the
    /// `agent-<id>-...` naming convention is parsed.
    pub fn agent_id(&self) -> Option<String> {
        let from_metadata = self
            .metadata
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .and_then(|m| serde_json::from_str::<RoomMetadata>(m).ok())
            .and_then(|m| m.agent_id)
            .filter(|id| !id.is_empty());

        from_metadata.or_else(|| {
            self.name
                .strip_prefix(AGENT_ROOM_PREFIX)
                .and_then(|rest| rest.split('-').next())
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
    }
}

/// A lifecycle notification for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    RoomStarted {
        room: Option<RoomInfo>,
    },
    ParticipantJoined {
        room: Option<RoomInfo>,
        identity: Option<String>,
    },
    ParticipantLeft {
        room: Option<RoomInfo>,
        identity: Option<String>,
    },
    RoomFinished {
        room: Option<RoomInfo>,
    },
    TrackPublished {
        room: Option<RoomInfo>,
        identity: Option<String>,
        track_sid: Option<String>,
    },
    /// Any event type this system does not react to.
    Other(String),
}

impl SessionEvent {
    /// Builds an event from the platform's event name and payload parts.
    pub fn from_parts(
        kind: &str,
        room: Option<RoomInfo>,
        identity: Option<String>,
        track_sid: Option<String>,
    ) -> Self {
        match kind {
            "room_started" => Self::RoomStarted { room },
            "participant_joined" => Self::ParticipantJoined { room, identity },
            "participant_left" => Self::ParticipantLeft { room, identity },
            "room_finished" => Self::RoomFinished { room },
            "track_published" => Self::TrackPublished {
                room,
                identity,
                track_sid,
            },
            other => Self::Other(other.to_string()),
        }
    }

    /// The platform's name for this event type.
    pub fn kind(&self) -> &str {
        match self {
            Self::RoomStarted { .. } => "room_started",
            Self::ParticipantJoined { .. } => "participant_joined",
            Self::ParticipantLeft { .. } => "participant_left",
            Self::RoomFinished { .. } => "room_finished",
            Self::TrackPublished { .. } => "track_published",
            Self::Other(kind) => kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_id_from_room_name() {
        assert_eq!(
            RoomInfo::named("agent-42-1700000000000").agent_id(),
            Some("42".to_string())
        );
        assert_eq!(RoomInfo::named("agent-42").agent_id(), Some("42".to_string()));
    }

    #[test]
    fn agent_id_absent_for_foreign_room_names() {
        assert_eq!(RoomInfo::named("support-room").agent_id(), None);
        assert_eq!(RoomInfo::named("agent--123").agent_id(), None);
        assert_eq!(RoomInfo::named("agent-").agent_id(), None);
    }

    #[test]
    fn metadata_takes_precedence_over_name() {
        let room = RoomInfo {
            name: "agent-42-1700000000000".into(),
            creation_time: None,
            metadata: Some(r#"{"agent_id":"7f3a"}"#.into()),
        };
        assert_eq!(room.agent_id(), Some("7f3a".to_string()));
    }

    #[test]
    fn unparseable_metadata_falls_back_to_name() {
        let room = RoomInfo {
            name: "agent-42-1".into(),
            creation_time: None,
            metadata: Some("not json".into()),
        };
        assert_eq!(room.agent_id(), Some("42".to_string()));
    }

    #[test]
    fn unknown_kind_is_other() {
        let event = SessionEvent::from_parts("egress_started", None, None, None);
        assert_eq!(event, SessionEvent::Other("egress_started".into()));
        assert_eq!(event.kind(), "egress_started");
    }
}
