//! Real-time media platform integration for Truvo.
//!
//! Wraps LiveKit for the three things the dashboard backend needs:
//! minting short-lived room join tokens for the playground, pre-creating
//! rooms tagged with the owning agent, and verifying the platform's signed
//! webhook notifications before translating them into
//! [`truvo_types::SessionEvent`]s.
//!
//! Audio transport and the voice pipeline itself live in the external
//! worker, not here.

pub mod config;
pub mod error;
pub mod service;
pub mod webhook;

pub use config::LiveKitConfig;
pub use error::VoiceError;
pub use service::{VoiceService, DEFAULT_TOKEN_TTL_SECONDS};
pub use webhook::WebhookVerifier;
