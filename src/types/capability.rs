//! Provider capability kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of work a provider performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Chat,
    Tts,
    Stt,
    Vad,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Chat,
        Capability::Tts,
        Capability::Stt,
        Capability::Vad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Tts => "tts",
            Self::Stt => "stt",
            Self::Vad => "vad",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chat" => Some(Self::Chat),
            "tts" => Some(Self::Tts),
            "stt" => Some(Self::Stt),
            "vad" => Some(Self::Vad),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
