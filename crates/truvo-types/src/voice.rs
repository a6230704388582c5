//! Text-to-speech voice catalog.
//!
//! Voice identifiers are ElevenLabs voice IDs, not display names. The worker
//! passes `voice_id` straight to the TTS provider.

use serde::Serialize;

/// A selectable text-to-speech voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Voice {
    pub id: &'static str,
    pub name: &'static str,
}

/// Voices offered in the agent editor.
pub const VOICES: &[Voice] = &[
    Voice {
        id: "21m00Tcm4TlvDq8ikWAM",
        name: "Rachel",
    },
    Voice {
        id: "EXAVITQu4vr4xnSDxMaL",
        name: "Bella",
    },
    Voice {
        id: "TxGEqnHWrfWFTfGW9XjX",
        name: "Josh",
    },
    Voice {
        id: "pNInz6obpgDQGcFmaJgB",
        name: "Adam",
    },
];
