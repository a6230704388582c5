use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use crate::webhook::WebhookVerifier;
use livekit_api::access_token::{AccessToken, VideoGrants};
use livekit_api::services::room::{CreateRoomOptions, RoomClient};
use std::fmt;
use std::time::Duration;
use truvo_types::SessionEvent;

/// Join token lifetime when none is configured.
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 3600;

/// Token issuing, room management, and webhook verification against one
/// LiveKit deployment. Holds no per-request state.
pub struct VoiceService {
    config: LiveKitConfig,
    room_client: RoomClient,
    verifier: WebhookVerifier,
}

impl fmt::Debug for VoiceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VoiceService {
    pub fn new(config: LiveKitConfig) -> Self {
        let room_client =
            RoomClient::with_api_key(&config.url, &config.api_key, &config.api_secret);
        let verifier = WebhookVerifier::new(&config.api_key, &config.api_secret);
        Self {
            config,
            room_client,
            verifier,
        }
    }

    /// Whether the platform endpoint and credentials are all configured.
    pub fn is_enabled(&self) -> bool {
        !self.config.url.is_empty() && self.config.has_credentials()
    }

    /// The connection endpoint returned to browsers alongside a token.
    pub fn get_url(&self) -> &str {
        &self.config.url
    }

    /// Upper bound on a best-effort `create_agent_room` call.
    pub fn room_create_timeout(&self) -> Duration {
        Duration::from_millis(self.config.room_create_timeout_ms)
    }

    /// Mints a join token for `identity` in `room_name`.
    ///
    /// The grant allows joining that one room with audio publish and
    /// subscribe, and expires after the configured TTL (1 hour by default).
    /// Nothing is persisted.
    pub fn generate_join_token(
        &self,
        room_name: &str,
        identity: &str,
    ) -> Result<String, VoiceError> {
        if !self.config.has_credentials() {
            return Err(VoiceError::Config(
                "LiveKit API key and secret are not configured".to_string(),
            ));
        }

        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(identity)
            .with_name(identity)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                can_publish: true,
                can_subscribe: true,
                ..Default::default()
            })
            .with_ttl(Duration::from_secs(self.config.token_ttl_seconds));

        let jwt = token.to_jwt().map_err(VoiceError::LiveKit)?;
        tracing::debug!(
            room = room_name,
            identity,
            ttl_seconds = self.config.token_ttl_seconds,
            "issued join token"
        );
        Ok(jwt)
    }

    /// Creates `room_name` on the platform tagged with the owning agent.
    ///
    /// The room metadata is `{"agent_id": "<id>"}`, which the webhook
    /// handler prefers over parsing the room name. Returns the room SID.
    pub async fn create_agent_room(
        &self,
        room_name: &str,
        agent_id: &str,
    ) -> Result<String, VoiceError> {
        let options = CreateRoomOptions {
            metadata: serde_json::json!({ "agent_id": agent_id }).to_string(),
            ..Default::default()
        };

        tracing::debug!(room = room_name, agent_id, "creating agent room");
        let room = self
            .room_client
            .create_room(room_name, options)
            .await
            .map_err(|e| VoiceError::RoomService(e.to_string()))?;
        Ok(room.sid)
    }

    /// Verifies a webhook delivery and decodes its event.
    ///
    /// `authorization` is the raw `Authorization` header value.
    pub fn verify_webhook(
        &self,
        body: &str,
        authorization: &str,
    ) -> Result<SessionEvent, VoiceError> {
        if !self.config.has_credentials() {
            return Err(VoiceError::Config(
                "LiveKit API key and secret are not configured".to_string(),
            ));
        }
        self.verifier.verify(body, authorization)
    }
}
