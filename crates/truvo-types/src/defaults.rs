//! Process-wide agent defaults.
//!
//! Loaded once at startup (optionally overridden from the `[defaults]`
//! config section) and never mutated afterwards.

use crate::{AgentConfig, ToolId};
use serde::{Deserialize, Serialize};

/// ElevenLabs "Rachel".
const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

const DEFAULT_GREETING: &str = "Hello, how can I help you today?";

const FALLBACK_SYSTEM_PROMPT: &str = "You are a friendly and professional real estate assistant.
Your role is to help potential tenants and buyers with property inquiries.
Be conversational, helpful, and concise. Keep responses brief for voice.";

const FALLBACK_GREETING: &str = "Hi there! Thanks for calling. How can I help you today?";

fn default_voice_id() -> String {
    DEFAULT_VOICE_ID.to_string()
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

fn default_tools() -> Vec<ToolId> {
    ToolId::ALL.to_vec()
}

fn default_fallback_system_prompt() -> String {
    FALLBACK_SYSTEM_PROMPT.to_string()
}

fn default_fallback_greeting() -> String {
    FALLBACK_GREETING.to_string()
}

/// Defaults applied when an agent is created with optional fields omitted,
/// and the configuration served when no agent record can be found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefaults {
    /// Voice for new agents and for the fallback configuration.
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    /// Greeting for new agents created without one.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Tool set for new agents, for stored agents with no tools, and for
    /// the fallback configuration.
    #[serde(default = "default_tools")]
    pub tools: Vec<ToolId>,

    /// Persona served to the worker when the agent is unknown.
    #[serde(default = "default_fallback_system_prompt")]
    pub fallback_system_prompt: String,

    /// Greeting served to the worker when the agent is unknown.
    #[serde(default = "default_fallback_greeting")]
    pub fallback_greeting: String,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            voice_id: default_voice_id(),
            greeting: default_greeting(),
            tools: default_tools(),
            fallback_system_prompt: default_fallback_system_prompt(),
            fallback_greeting: default_fallback_greeting(),
        }
    }
}

impl AgentDefaults {
    /// The complete configuration used when no agent record is available.
    pub fn fallback_config(&self) -> AgentConfig {
        AgentConfig {
            system_prompt: self.fallback_system_prompt.clone(),
            greeting: self.fallback_greeting.clone(),
            voice_id: self.voice_id.clone(),
            tools_enabled: self.tools.clone(),
        }
    }
}
