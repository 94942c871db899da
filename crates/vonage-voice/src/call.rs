//! Outbound call requests and the event returned when one is created.

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};

use crate::{
    error::{VoiceError, ensure_not_blank, invalid_input},
    ncco::Ncco,
};

/// A party on a call, tagged by `type` on the wire.
///
/// Endpoint types this crate does not model decode as
/// [`Endpoint::Unknown`] so a single odd record never fails a whole page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Endpoint {
    Phone {
        number: String,
        /// Digits sent once the callee answers.
        #[serde(
            default,
            rename = "dtmfAnswer",
            skip_serializing_if = "Option::is_none"
        )]
        dtmf_answer: Option<String>,
    },
    Websocket {
        uri: String,
        #[serde(rename = "content-type")]
        content_type: String,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        headers: HashMap<String, String>,
    },
    Sip {
        uri: String,
    },
    Vbc {
        extension: String,
    },
    /// An in-app user of a client SDK.
    App {
        user: String,
    },
    /// Received only; rejected when placing a call.
    #[serde(other)]
    Unknown,
}

impl Endpoint {
    pub fn phone(number: impl Into<String>) -> Self {
        Endpoint::Phone {
            number: number.into(),
            dtmf_answer: None,
        }
    }

    /// A websocket endpoint receiving 16kHz linear PCM audio.
    pub fn websocket(uri: impl Into<String>) -> Self {
        Endpoint::Websocket {
            uri: uri.into(),
            content_type: "audio/l16;rate=16000".to_string(),
            headers: HashMap::new(),
        }
    }

    pub fn sip(uri: impl Into<String>) -> Self {
        Endpoint::Sip { uri: uri.into() }
    }

    /// The phone number, for phone endpoints.
    pub fn number(&self) -> Option<&str> {
        match self {
            Endpoint::Phone { number, .. } => Some(number),
            _ => None,
        }
    }
}

/// Bare strings are treated as phone numbers.
impl From<&str> for Endpoint {
    fn from(number: &str) -> Self {
        Endpoint::phone(number)
    }
}

impl From<String> for Endpoint {
    fn from(number: String) -> Self {
        Endpoint::phone(number)
    }
}

/// Where the platform obtains the NCCO once the call is answered.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerTarget {
    /// Fetched from the application's webhook.
    Url(String),
    /// Supplied inline with the request.
    Ncco(Ncco),
}

impl From<&str> for AnswerTarget {
    fn from(url: &str) -> Self {
        AnswerTarget::Url(url.to_string())
    }
}

impl From<String> for AnswerTarget {
    fn from(url: String) -> Self {
        AnswerTarget::Url(url)
    }
}

impl From<Ncco> for AnswerTarget {
    fn from(ncco: Ncco) -> Self {
        AnswerTarget::Ncco(ncco)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// Behaviour when an answering machine picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineDetection {
    Continue,
    Hangup,
}

/// Request to place an outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    to: Vec<Endpoint>,
    from: Endpoint,
    answer: AnswerTarget,
    answer_method: Option<HttpMethod>,
    event_url: Option<String>,
    event_method: Option<HttpMethod>,
    machine_detection: Option<MachineDetection>,
    length_timer: Option<u32>,
    ringing_timer: Option<u32>,
}

impl Call {
    pub fn new(
        to: impl Into<Endpoint>,
        from: impl Into<Endpoint>,
        answer: impl Into<AnswerTarget>,
    ) -> Self {
        Self {
            to: vec![to.into()],
            from: from.into(),
            answer: answer.into(),
            answer_method: None,
            event_url: None,
            event_method: None,
            machine_detection: None,
            length_timer: None,
            ringing_timer: None,
        }
    }

    /// Rings an additional endpoint alongside the first one.
    #[must_use]
    pub fn also_to(mut self, endpoint: impl Into<Endpoint>) -> Self {
        self.to.push(endpoint.into());
        self
    }

    #[must_use]
    pub fn answer_method(mut self, method: HttpMethod) -> Self {
        self.answer_method = Some(method);
        self
    }

    #[must_use]
    pub fn event_url(mut self, url: impl Into<String>) -> Self {
        self.event_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn event_method(mut self, method: HttpMethod) -> Self {
        self.event_method = Some(method);
        self
    }

    #[must_use]
    pub fn machine_detection(mut self, detection: MachineDetection) -> Self {
        self.machine_detection = Some(detection);
        self
    }

    /// Maximum call length in seconds.
    #[must_use]
    pub fn length_timer(mut self, seconds: u32) -> Self {
        self.length_timer = Some(seconds);
        self
    }

    /// Seconds to ring before giving up.
    #[must_use]
    pub fn ringing_timer(mut self, seconds: u32) -> Self {
        self.ringing_timer = Some(seconds);
        self
    }

    pub fn to(&self) -> &[Endpoint] {
        &self.to
    }

    pub fn caller(&self) -> &Endpoint {
        &self.from
    }

    pub fn answer(&self) -> &AnswerTarget {
        &self.answer
    }

    /// Checks that every endpoint is addressable and the answer target is
    /// usable.
    pub(crate) fn validate(&self) -> Result<(), VoiceError> {
        for endpoint in self.to.iter().chain([&self.from]) {
            endpoint.validate()?;
        }
        match &self.answer {
            AnswerTarget::Url(url) => ensure_not_blank(url, "answer_url"),
            AnswerTarget::Ncco(ncco) => ncco.ensure_not_empty("answer NCCO"),
        }
    }
}

impl Endpoint {
    fn validate(&self) -> Result<(), VoiceError> {
        match self {
            Endpoint::Phone { number, .. } => ensure_not_blank(number, "phone number"),
            Endpoint::Websocket { uri, .. } => ensure_not_blank(uri, "websocket uri"),
            Endpoint::Sip { uri } => ensure_not_blank(uri, "sip uri"),
            Endpoint::Vbc { extension } => ensure_not_blank(extension, "vbc extension"),
            Endpoint::App { user } => ensure_not_blank(user, "app user"),
            Endpoint::Unknown => Err(invalid_input("unknown endpoint type")),
        }
    }
}

#[derive(Serialize)]
struct CallWire<'a> {
    to: &'a [Endpoint],
    from: &'a Endpoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer_url: Option<[&'a str; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ncco: Option<&'a Ncco>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer_method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_url: Option<[&'a str; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    machine_detection: Option<MachineDetection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    length_timer: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ringing_timer: Option<u32>,
}

impl Serialize for Call {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (answer_url, ncco) = match &self.answer {
            AnswerTarget::Url(url) => (Some([url.as_str()]), None),
            AnswerTarget::Ncco(ncco) => (None, Some(ncco)),
        };

        CallWire {
            to: &self.to,
            from: &self.from,
            answer_url,
            ncco,
            answer_method: self.answer_method,
            event_url: self.event_url.as_deref().map(|url| [url]),
            event_method: self.event_method,
            machine_detection: self.machine_detection,
            length_timer: self.length_timer,
            ringing_timer: self.ringing_timer,
        }
        .serialize(serializer)
    }
}

/// Lifecycle state of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Started,
    Ringing,
    Answered,
    Machine,
    Completed,
    Busy,
    Cancelled,
    Failed,
    Rejected,
    Timeout,
    Unanswered,
    #[serde(other)]
    Unknown,
}

impl CallStatus {
    /// Wire representation, as used in query filters.
    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Started => "started",
            CallStatus::Ringing => "ringing",
            CallStatus::Answered => "answered",
            CallStatus::Machine => "machine",
            CallStatus::Completed => "completed",
            CallStatus::Busy => "busy",
            CallStatus::Cancelled => "cancelled",
            CallStatus::Failed => "failed",
            CallStatus::Rejected => "rejected",
            CallStatus::Timeout => "timeout",
            CallStatus::Unanswered => "unanswered",
            CallStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Inbound,
    Outbound,
    #[serde(other)]
    Unknown,
}

/// Returned when a call is created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CallEvent {
    #[serde(default)]
    pub uuid: Option<String>,
    pub conversation_uuid: String,
    pub status: CallStatus,
    pub direction: CallDirection,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ncco::TalkAction;

    #[test]
    fn test_call_with_answer_url_serializes_wire_shape() {
        let call = Call::new(
            "447700900903",
            "447700900904",
            "http://api.example.com/answer",
        );

        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({
                "to": [{"type": "phone", "number": "447700900903"}],
                "from": {"type": "phone", "number": "447700900904"},
                "answer_url": ["http://api.example.com/answer"],
            })
        );
    }

    #[test]
    fn test_call_with_inline_ncco_omits_answer_url() {
        let ncco = Ncco::new([TalkAction::builder("Hi").build()]);
        let call = Call::new("447700900903", "447700900904", ncco)
            .event_url("https://example.com/events")
            .event_method(HttpMethod::Post)
            .machine_detection(MachineDetection::Hangup)
            .length_timer(600)
            .ringing_timer(30);

        let value = serde_json::to_value(&call).unwrap();

        assert!(value.get("answer_url").is_none());
        assert_eq!(value["ncco"], json!([{"action": "talk", "text": "Hi"}]));
        assert_eq!(value["event_url"], json!(["https://example.com/events"]));
        assert_eq!(value["event_method"], "POST");
        assert_eq!(value["machine_detection"], "hangup");
        assert_eq!(value["length_timer"], 600);
        assert_eq!(value["ringing_timer"], 30);
    }

    #[test]
    fn test_call_to_multiple_endpoints() {
        let call = Call::new("447700900903", "447700900904", "https://example.com/answer")
            .also_to(Endpoint::sip("sip:rebekka@sip.example.com"))
            .also_to(Endpoint::websocket("wss://example.com/socket"));

        let value = serde_json::to_value(&call).unwrap();

        assert_eq!(call.to().len(), 3);
        assert_eq!(
            value["to"][1],
            json!({"type": "sip", "uri": "sip:rebekka@sip.example.com"})
        );
        assert_eq!(
            value["to"][2],
            json!({
                "type": "websocket",
                "uri": "wss://example.com/socket",
                "content-type": "audio/l16;rate=16000",
            })
        );
    }

    #[test]
    fn test_phone_endpoint_with_dtmf_answer() {
        let endpoint = Endpoint::Phone {
            number: "447700900903".to_string(),
            dtmf_answer: Some("p*123#".to_string()),
        };

        assert_eq!(
            serde_json::to_value(&endpoint).unwrap(),
            json!({"type": "phone", "number": "447700900903", "dtmfAnswer": "p*123#"})
        );
        assert_eq!(endpoint.number(), Some("447700900903"));
    }

    #[test]
    fn test_call_event_decodes_server_fields() {
        let event: CallEvent = serde_json::from_str(
            r#"{
              "uuid": "63f61863-4a51-4f6b-86e1-46edebcf9356",
              "conversation_uuid": "63f61863-4a51-4f6b-86e1-46edebio0391",
              "status": "started",
              "direction": "outbound"
            }"#,
        )
        .unwrap();

        assert_eq!(
            event.conversation_uuid,
            "63f61863-4a51-4f6b-86e1-46edebio0391"
        );
        assert_eq!(event.status, CallStatus::Started);
        assert_eq!(event.direction, CallDirection::Outbound);
    }

    #[test]
    fn test_validate_rejects_blank_numbers_and_empty_ncco() {
        let answer = "https://example.com/answer";
        let valid = Call::new("447700900903", "447700900904", answer);
        let blank_to = Call::new(" ", "447700900904", answer);
        let empty_ncco = Call::new("447700900903", "447700900904", Ncco::default());
        let blank_answer = Call::new("447700900903", "447700900904", "");

        assert!(valid.validate().is_ok());
        assert!(blank_to.validate().is_err());
        assert!(empty_ncco.validate().is_err());
        assert!(blank_answer.validate().is_err());
    }

    #[test]
    fn test_unknown_endpoint_decodes_but_cannot_be_dialled() {
        let app = json!({"type": "app", "user": "alice"});
        let other = json!({"type": "mystery"});

        let app: Endpoint = serde_json::from_value(app).unwrap();
        let other: Endpoint = serde_json::from_value(other).unwrap();
        let expected = Endpoint::App {
            user: "alice".to_string(),
        };

        assert_eq!(app, expected);
        assert_eq!(other, Endpoint::Unknown);

        let answer = "https://example.com/answer";
        let call = Call::new(Endpoint::Unknown, "447700900904", answer);
        assert!(matches!(call.validate(), Err(VoiceError::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_status_decodes_as_unknown() {
        let status: CallStatus = serde_json::from_str(r#""transferring""#).unwrap();
        assert_eq!(status, CallStatus::Unknown);
    }
}
