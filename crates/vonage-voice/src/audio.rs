//! Audio injected into a live call: file streams and text-to-speech.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize, Serializer};

use crate::voice_name::VoiceName;

/// How many times audio is played.
///
/// The API encodes "until the call ends or playback is stopped" as `0`;
/// that case is spelled out as [`LoopCount::Infinite`] here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Times(NonZeroU32),
    Infinite,
}

impl LoopCount {
    pub const ONCE: LoopCount = LoopCount::Times(NonZeroU32::MIN);

    /// Value sent on the wire.
    pub fn get(self) -> u32 {
        match self {
            LoopCount::Times(n) => n.get(),
            LoopCount::Infinite => 0,
        }
    }
}

impl Default for LoopCount {
    fn default() -> Self {
        LoopCount::ONCE
    }
}

/// Interprets the wire value: `0` is [`LoopCount::Infinite`].
impl From<u32> for LoopCount {
    fn from(value: u32) -> Self {
        NonZeroU32::new(value).map_or(LoopCount::Infinite, LoopCount::Times)
    }
}

impl Serialize for LoopCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.get())
    }
}

/// Clamps a volume into `-1.0..=1.0`. Non-finite input yields `None` so the
/// field is left off the wire.
pub(crate) fn normalize_level(level: f32) -> Option<f32> {
    level.is_finite().then(|| level.clamp(-1.0, 1.0))
}

/// Body of a start-stream request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamPayload {
    stream_url: [String; 1],
    #[serde(rename = "loop")]
    loop_count: LoopCount,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<f32>,
}

impl StreamPayload {
    pub fn new(stream_url: impl Into<String>) -> Self {
        Self {
            stream_url: [stream_url.into()],
            loop_count: LoopCount::default(),
            level: None,
        }
    }

    #[must_use]
    pub fn loop_count(mut self, loop_count: LoopCount) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Volume between `-1.0` and `1.0`; out-of-range values are clamped
    /// and NaN or infinite values unset the level.
    #[must_use]
    pub fn level(mut self, level: f32) -> Self {
        self.level = normalize_level(level);
        self
    }

    pub fn stream_url(&self) -> &str {
        &self.stream_url[0]
    }
}

/// Body of a start-talk request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TalkPayload {
    text: String,
    voice_name: VoiceName,
    #[serde(rename = "loop")]
    loop_count: LoopCount,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<f32>,
}

impl TalkPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_name: VoiceName::default(),
            loop_count: LoopCount::default(),
            level: None,
        }
    }

    #[must_use]
    pub fn voice_name(mut self, voice_name: VoiceName) -> Self {
        self.voice_name = voice_name;
        self
    }

    #[must_use]
    pub fn loop_count(mut self, loop_count: LoopCount) -> Self {
        self.loop_count = loop_count;
        self
    }

    #[must_use]
    pub fn level(mut self, level: f32) -> Self {
        self.level = normalize_level(level);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Acknowledgement of a start/stop stream request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamResponse {
    pub message: String,
    #[serde(default)]
    pub uuid: Option<String>,
}

/// Acknowledgement of a start/stop talk request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TalkResponse {
    pub message: String,
    #[serde(default)]
    pub uuid: Option<String>,
}
