use serde::{Deserialize, Serialize};
use std::fmt;

fn default_token_ttl_seconds() -> u64 {
    crate::DEFAULT_TOKEN_TTL_SECONDS
}

fn default_room_create_timeout_ms() -> u64 {
    3_000
}

/// Connection settings for the LiveKit deployment.
///
/// Secrets have no defaults: an empty key or secret leaves token issuance
/// and webhook verification disabled.
#[derive(Clone, Serialize, Deserialize)]
pub struct LiveKitConfig {
    /// Endpoint handed to browsers (`wss://...`).
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing)]
    pub api_secret: String,
    /// Join token lifetime in seconds. Default: 3600 (1 hour).
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
    /// How long the token route waits on room pre-creation before issuing
    /// the token anyway. Default: 3000.
    #[serde(default = "default_room_create_timeout_ms")]
    pub room_create_timeout_ms: u64,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            token_ttl_seconds: default_token_ttl_seconds(),
            room_create_timeout_ms: default_room_create_timeout_ms(),
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("room_create_timeout_ms", &self.room_create_timeout_ms)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token_ttl_seconds: default_token_ttl_seconds(),
            room_create_timeout_ms: default_room_create_timeout_ms(),
        }
    }

    /// Whether both API credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}
