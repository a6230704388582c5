//! Webhook signature verification.
//!
//! LiveKit signs each delivery with a JWT in the `Authorization` header
//! whose `sha256` claim is the base64 SHA-256 of the raw body. The token is
//! signed with the API secret, so both the sender and the payload are
//! checked before anything is decoded.

use crate::error::VoiceError;
use livekit_api::access_token::TokenVerifier;
use livekit_api::webhooks::WebhookReceiver;
use truvo_types::{RoomInfo, SessionEvent};

pub struct WebhookVerifier {
    receiver: WebhookReceiver,
}

impl WebhookVerifier {
    pub fn new(api_key: &str, api_secret: &str) -> Self {
        Self {
            receiver: WebhookReceiver::new(TokenVerifier::with_api_key(api_key, api_secret)),
        }
    }

    /// Checks the signature over `body` and decodes the event it carries.
    pub fn verify(&self, body: &str, authorization: &str) -> Result<SessionEvent, VoiceError> {
        let token = authorization
            .strip_prefix("Bearer ")
            .unwrap_or(authorization)
            .trim();

        let event = self.receiver.receive(body, token).map_err(|e| {
            tracing::debug!(error = %e, "webhook signature rejected");
            e
        })?;

        let room = event.room.as_ref().map(|room| RoomInfo {
            name: room.name.clone(),
            creation_time: Some(room.creation_time).filter(|secs| *secs > 0),
            metadata: Some(room.metadata.clone()).filter(|m| !m.is_empty()),
        });
        let identity = event
            .participant
            .as_ref()
            .map(|p| p.identity.clone())
            .filter(|identity| !identity.is_empty());
        let track_sid = event
            .track
            .as_ref()
            .map(|t| t.sid.clone())
            .filter(|sid| !sid.is_empty());

        tracing::debug!(
            event = %event.event,
            id = %event.id,
            room = room.as_ref().map(|r| r.name.as_str()).unwrap_or(""),
            "verified webhook"
        );
        Ok(SessionEvent::from_parts(&event.event, room, identity, track_sid))
    }
}
