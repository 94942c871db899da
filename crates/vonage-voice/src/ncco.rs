//! Call control objects (NCCOs).
//!
//! An NCCO is an ordered list of actions the platform executes on a call.
//! This crate only builds and serializes them; execution happens remotely.

use serde::{Deserialize, Serialize};

use crate::{
    audio::normalize_level,
    call::Endpoint,
    error::{Result, invalid_input},
    voice_name::VoiceName,
};

/// An ordered call control script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ncco(Vec<NccoAction>);

impl Ncco {
    pub fn new(actions: impl IntoIterator<Item = impl Into<NccoAction>>) -> Self {
        Self(actions.into_iter().map(Into::into).collect())
    }

    pub fn actions(&self) -> &[NccoAction] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn push(mut self, action: impl Into<NccoAction>) -> Self {
        self.0.push(action.into());
        self
    }

    pub(crate) fn ensure_not_empty(&self, name: &str) -> Result<()> {
        if self.is_empty() {
            let message = format!("{name} must contain at least one action");
            return Err(invalid_input(message));
        }
        Ok(())
    }
}

impl<A: Into<NccoAction>> FromIterator<A> for Ncco {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// A single NCCO step, tagged by `action` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum NccoAction {
    Talk(TalkAction),
    Stream(StreamAction),
    Connect(ConnectAction),
    Input(InputAction),
    Record(RecordAction),
    Notify(NotifyAction),
    Conversation(ConversationAction),
}

macro_rules! impl_into_action {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for NccoAction {
                fn from(action: $ty) -> Self {
                    NccoAction::$variant(action)
                }
            }
        )*
    };
}

impl_into_action! {
    TalkAction => Talk,
    StreamAction => Stream,
    ConnectAction => Connect,
    InputAction => Input,
    RecordAction => Record,
    NotifyAction => Notify,
    ConversationAction => Conversation,
}

/// Reads text to the call using speech synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkAction {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<VoiceName>,
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barge_in: Option<bool>,
}

impl TalkAction {
    pub fn builder(text: impl Into<String>) -> TalkActionBuilder {
        TalkActionBuilder {
            action: TalkAction {
                text: text.into(),
                voice_name: None,
                loop_count: None,
                level: None,
                barge_in: None,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct TalkActionBuilder {
    action: TalkAction,
}

impl TalkActionBuilder {
    #[must_use]
    pub fn voice_name(mut self, voice_name: VoiceName) -> Self {
        self.action.voice_name = Some(voice_name);
        self
    }

    /// Number of repetitions; `0` repeats until the call ends.
    #[must_use]
    pub fn loop_count(mut self, loop_count: u32) -> Self {
        self.action.loop_count = Some(loop_count);
        self
    }

    /// Volume between `-1.0` and `1.0`; out-of-range values are clamped
    /// and NaN or infinite values unset the level.
    #[must_use]
    pub fn level(mut self, level: f32) -> Self {
        self.action.level = normalize_level(level);
        self
    }

    #[must_use]
    pub fn barge_in(mut self, barge_in: bool) -> Self {
        self.action.barge_in = Some(barge_in);
        self
    }

    pub fn build(self) -> TalkAction {
        self.action
    }
}

/// Streams an audio file into the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamAction {
    pub stream_url: Vec<String>,
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barge_in: Option<bool>,
}

impl StreamAction {
    pub fn builder(stream_url: impl Into<String>) -> StreamActionBuilder {
        StreamActionBuilder {
            action: StreamAction {
                stream_url: vec![stream_url.into()],
                loop_count: None,
                level: None,
                barge_in: None,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamActionBuilder {
    action: StreamAction,
}

impl StreamActionBuilder {
    #[must_use]
    pub fn loop_count(mut self, loop_count: u32) -> Self {
        self.action.loop_count = Some(loop_count);
        self
    }

    #[must_use]
    pub fn level(mut self, level: f32) -> Self {
        self.action.level = normalize_level(level);
        self
    }

    #[must_use]
    pub fn barge_in(mut self, barge_in: bool) -> Self {
        self.action.barge_in = Some(barge_in);
        self
    }

    pub fn build(self) -> StreamAction {
        self.action
    }
}

/// Connects the call to one or more endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAction {
    pub endpoint: Vec<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_url: Vec<String>,
}

impl ConnectAction {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint: vec![endpoint],
            from: None,
            timeout: None,
            limit: None,
            event_url: Vec::new(),
        }
    }
}

/// Collects DTMF digits entered by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_out: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_digits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_on_hash: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_url: Vec<String>,
}

/// Records the call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_on_silence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beep_start: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_url: Vec<String>,
}

/// Posts a payload to the application's webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyAction {
    pub payload: serde_json::Value,
    pub event_url: Vec<String>,
}

/// Joins the call to a named conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAction {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_on_enter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_on_exit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<bool>,
}
