//! Applies real-time platform lifecycle events to the call ledger.
//!
//! Stateless: the only per-room state is the call row itself.
//!
//! | Event                | Effect                                              |
//! |----------------------|-----------------------------------------------------|
//! | `participant_joined` | human identity: open a call for the room            |
//! | `room_finished`      | finalize the most recent open call for the room     |
//! | anything else        | logged only                                         |

use crate::{create_call, finish_open_call, Call, CallError, NewCall};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use truvo_types::{RoomInfo, SessionEvent, AGENT_IDENTITY_PREFIX};

/// What [`reconcile`] did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The event does not touch the ledger.
    Ignored,
    /// A human joined and a call was opened.
    CallOpened(Call),
    /// The room's open call was finalized.
    CallFinished {
        call_id: String,
        duration_seconds: Option<i64>,
    },
    /// The room finished but had no open call (already finalized, or never
    /// opened).
    NoOpenCall,
}

/// Applies one lifecycle event, received at `received_at`, to the ledger.
///
/// # Errors
///
/// Returns `CallError` if the ledger mutation fails. The event is not
/// retried; redelivery is up to the platform.
pub fn reconcile(
    conn: &Connection,
    event: &SessionEvent,
    received_at: DateTime<Utc>,
) -> Result<Reconciliation, CallError> {
    match event {
        SessionEvent::RoomStarted { room } => {
            tracing::info!(room = room_name(room), "room started");
            Ok(Reconciliation::Ignored)
        }
        SessionEvent::ParticipantJoined { room, identity } => {
            tracing::info!(
                room = room_name(room),
                identity = identity.as_deref().unwrap_or("<none>"),
                "participant joined"
            );
            participant_joined(conn, room.as_ref(), identity.as_deref(), received_at)
        }
        SessionEvent::ParticipantLeft { room, identity } => {
            tracing::info!(
                room = room_name(room),
                identity = identity.as_deref().unwrap_or("<none>"),
                "participant left"
            );
            Ok(Reconciliation::Ignored)
        }
        SessionEvent::RoomFinished { room } => {
            tracing::info!(room = room_name(room), "room finished");
            match room {
                Some(room) => room_finished(conn, room, received_at),
                None => Ok(Reconciliation::Ignored),
            }
        }
        SessionEvent::TrackPublished {
            room,
            identity,
            track_sid,
        } => {
            tracing::info!(
                room = room_name(room),
                identity = identity.as_deref().unwrap_or("<none>"),
                track = track_sid.as_deref().unwrap_or("<none>"),
                "track published"
            );
            Ok(Reconciliation::Ignored)
        }
        SessionEvent::Other(kind) => {
            tracing::debug!(event = %kind, "ignoring unhandled webhook event");
            Ok(Reconciliation::Ignored)
        }
    }
}

fn room_name(room: &Option<RoomInfo>) -> &str {
    room.as_ref().map(|r| r.name.as_str()).unwrap_or("<none>")
}

fn participant_joined(
    conn: &Connection,
    room: Option<&RoomInfo>,
    identity: Option<&str>,
    received_at: DateTime<Utc>,
) -> Result<Reconciliation, CallError> {
    let Some(identity) = identity.filter(|i| !i.starts_with(AGENT_IDENTITY_PREFIX)) else {
        return Ok(Reconciliation::Ignored);
    };
    let Some(room) = room.filter(|r| !r.name.is_empty()) else {
        tracing::warn!(identity, "participant joined without a room, no call recorded");
        return Ok(Reconciliation::Ignored);
    };

    // Not deduplicated: every human join opens its own row.
    let new = NewCall {
        agent_id: room.agent_id(),
        room_name: room.name.clone(),
        metadata: Some(serde_json::json!({ "participant": identity })),
    };
    let call = create_call(conn, &new, received_at)?;

    tracing::info!(
        call_id = %call.id,
        room = %call.room_name,
        agent_id = call.agent_id.as_deref().unwrap_or("<none>"),
        "call opened"
    );
    Ok(Reconciliation::CallOpened(call))
}

fn room_finished(
    conn: &Connection,
    room: &RoomInfo,
    received_at: DateTime<Utc>,
) -> Result<Reconciliation, CallError> {
    let duration_seconds = room
        .creation_time
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|started| {
            let millis = (received_at - started).num_milliseconds();
            (millis as f64 / 1000.0).round() as i64
        });

    match finish_open_call(conn, &room.name, received_at, duration_seconds)? {
        Some(call_id) => {
            tracing::info!(%call_id, room = %room.name, ?duration_seconds, "call finished");
            Ok(Reconciliation::CallFinished {
                call_id,
                duration_seconds,
            })
        }
        None => {
            tracing::debug!(room = %room.name, "no open call for finished room");
            Ok(Reconciliation::NoOpenCall)
        }
    }
}
