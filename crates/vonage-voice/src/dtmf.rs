//! DTMF tones sent into an in-progress call.

use serde::{Deserialize, Serialize};

use crate::error::{Result, invalid_input};

/// Body of a send-DTMF request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DtmfPayload {
    digits: String,
}

impl DtmfPayload {
    /// Validates `digits` against the keypad alphabet: `0-9`, `*`, `#`, and
    /// `p` for a 500ms pause.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::InvalidInput`](crate::VoiceError::InvalidInput)
    /// if `digits` is empty or contains any other character.
    pub fn new(digits: impl Into<String>) -> Result<Self> {
        let digits = digits.into();
        if digits.is_empty() {
            return Err(invalid_input("digits must not be empty"));
        }
        if let Some(bad) = digits.chars().find(|c| !is_dtmf(*c)) {
            return Err(invalid_input(format!("'{bad}' is not a DTMF digit")));
        }
        Ok(Self { digits })
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }
}

fn is_dtmf(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '*' | '#' | 'p')
}

/// Acknowledgement of a send-DTMF request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DtmfResponse {
    pub message: String,
    #[serde(default)]
    pub uuid: Option<String>,
}
