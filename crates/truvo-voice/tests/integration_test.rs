use base64::Engine;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use livekit_api::access_token::AccessToken;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};
use truvo_types::SessionEvent;
use truvo_voice::{LiveKitConfig, VoiceError, VoiceService, DEFAULT_TOKEN_TTL_SECONDS};

const URL: &str = "wss://voice.example.test";
const KEY: &str = "devkey";
const SECRET: &str = "devsecret-devsecret-devsecret-00";

#[derive(Deserialize)]
struct Claims {
    sub: String,
    exp: u64,
    nbf: u64,
    video: VideoClaims,
}

#[derive(Deserialize)]
struct VideoClaims {
    #[serde(rename = "roomJoin")]
    room_join: bool,
    room: String,
    #[serde(rename = "canPublish")]
    can_publish: bool,
    #[serde(rename = "canSubscribe")]
    can_subscribe: bool,
}

fn service() -> VoiceService {
    VoiceService::new(LiveKitConfig::new(URL, KEY, SECRET))
}

fn decode_claims(token: &str) -> Claims {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.set_issuer(&[KEY]);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &validation,
    )
    .expect("token should verify with the API secret")
    .claims
}

fn signed_header(body: &str) -> String {
    let digest = Sha256::digest(body.as_bytes());
    let hash = base64::engine::general_purpose::STANDARD.encode(digest);
    AccessToken::with_api_key(KEY, SECRET)
        .with_sha256(&hash)
        .to_jwt()
        .expect("failed to sign webhook")
}

#[test]
fn test_join_token_grants_single_room() {
    let token = service()
        .generate_join_token("agent-abc-1700000000000", "user-1700000000000")
        .expect("failed to generate token");

    let claims = decode_claims(&token);
    assert_eq!(claims.sub, "user-1700000000000");
    assert!(claims.video.room_join);
    assert_eq!(claims.video.room, "agent-abc-1700000000000");
    assert!(claims.video.can_publish);
    assert!(claims.video.can_subscribe);
    assert!(claims.exp - claims.nbf <= DEFAULT_TOKEN_TTL_SECONDS + 5);
}

#[test]
fn test_join_token_honors_configured_ttl() {
    let mut config = LiveKitConfig::new(URL, KEY, SECRET);
    config.token_ttl_seconds = 60;
    let token = VoiceService::new(config)
        .generate_join_token("room", "user-1")
        .unwrap();

    let claims = decode_claims(&token);
    assert!(claims.exp - claims.nbf <= 65);
}

#[test]
fn test_join_token_requires_credentials() {
    let service = VoiceService::new(LiveKitConfig::new(URL, "", ""));
    assert!(!service.is_enabled());
    let err = service.generate_join_token("room", "user-1").unwrap_err();
    assert!(matches!(err, VoiceError::Config(_)));
}

#[test]
fn test_config_from_toml_applies_defaults() {
    let config: LiveKitConfig = toml::from_str(
        r#"
        url = "wss://voice.example.test"
        api_key = "k"
        api_secret = "s"
        "#,
    )
    .unwrap();
    assert_eq!(config.token_ttl_seconds, DEFAULT_TOKEN_TTL_SECONDS);
    assert_eq!(config.room_create_timeout_ms, 3_000);
    assert_eq!(
        VoiceService::new(config.clone()).room_create_timeout(),
        std::time::Duration::from_secs(3)
    );
    assert!(config.has_credentials());
    assert!(!format!("{config:?}").contains("\"s\""));
}

#[test]
fn test_webhook_participant_joined_decodes() {
    let body = r#"{
        "event": "participant_joined",
        "room": {"name": "agent-abc-1", "creationTime": "1700000000", "metadata": "{\"agent_id\":\"abc\"}"},
        "participant": {"identity": "user-1"}
    }"#;

    let event = service()
        .verify_webhook(body, &signed_header(body))
        .expect("webhook should verify");

    let SessionEvent::ParticipantJoined { room, identity } = event else {
        panic!("expected participant_joined, got {event:?}");
    };
    let room = room.expect("room should be present");
    assert_eq!(room.name, "agent-abc-1");
    assert_eq!(room.creation_time, Some(1_700_000_000));
    assert_eq!(room.agent_id().as_deref(), Some("abc"));
    assert_eq!(identity.as_deref(), Some("user-1"));
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_webhook_verification_is_traced() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let body = r#"{"event": "room_started", "room": {"name": "agent-abc-1"}}"#;
    let tampered = r#"{"event": "room_started", "room": {"name": "agent-xyz-1"}}"#;
    tracing::subscriber::with_default(subscriber, || {
        let service = service();
        service.verify_webhook(body, &signed_header(body)).unwrap();
        service
            .verify_webhook(tampered, &signed_header(body))
            .unwrap_err();
    });

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("verified webhook"), "{output}");
    assert!(output.contains("room_started"), "{output}");
    assert!(output.contains("webhook signature rejected"), "{output}");
}

#[test]
fn test_webhook_accepts_bearer_prefix() {
    let body = r#"{"event": "room_finished", "room": {"name": "lobby"}}"#;
    let header = format!("Bearer {}", signed_header(body));

    let event = service().verify_webhook(body, &header).unwrap();
    let SessionEvent::RoomFinished { room: Some(room) } = event else {
        panic!("expected room_finished, got {event:?}");
    };
    assert_eq!(room.name, "lobby");
    assert_eq!(room.creation_time, None);
    assert_eq!(room.metadata, None);
}

#[test]
fn test_webhook_rejects_tampered_body() {
    let body = r#"{"event": "room_finished", "room": {"name": "lobby"}}"#;
    let header = signed_header(body);
    let tampered = r#"{"event": "room_finished", "room": {"name": "other"}}"#;

    let err = service().verify_webhook(tampered, &header).unwrap_err();
    assert!(matches!(err, VoiceError::Webhook(_)));
}

#[test]
fn test_webhook_rejects_foreign_secret() {
    let body = r#"{"event": "room_started", "room": {"name": "lobby"}}"#;
    let other = VoiceService::new(LiveKitConfig::new(
        URL,
        KEY,
        "a-completely-different-secret-000",
    ));
    assert!(other.verify_webhook(body, &signed_header(body)).is_err());
}

#[tokio::test]
async fn test_create_agent_room_unreachable_server_errors() {
    // Nothing listens on this port; creation is best-effort for callers.
    let service = VoiceService::new(LiveKitConfig::new("http://127.0.0.1:9", KEY, SECRET));
    let err = service
        .create_agent_room("agent-abc-1", "abc")
        .await
        .unwrap_err();
    assert!(matches!(err, VoiceError::RoomService(_)));
}
