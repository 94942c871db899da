//! Error types for the Voice API client.

use serde::Deserialize;

use crate::{auth::AuthError, config::ConfigError, transport::TransportError};

/// Result alias used throughout the crate.
pub type Result<T, E = VoiceError> = std::result::Result<T, E>;

/// Errors returned by [`VoiceClient`](crate::VoiceClient) operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum VoiceError {
    /// The request never produced an HTTP response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The API answered 404 for the addressed resource.
    #[error("resource not found: {url}")]
    NotFound {
        url: String,
        error: Option<ApiErrorBody>,
        raw: String,
    },

    /// The API answered with any other non-success status.
    #[error("Voice API request failed ({status}): {}", summarize(.error.as_ref(), .raw))]
    Api {
        status: u16,
        error: Option<ApiErrorBody>,
        raw: String,
    },

    /// A success response carried a body that is not the expected JSON shape.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The bearer token could not be produced.
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Caller input failed validation before any request was built.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl VoiceError {
    /// HTTP status of an API-level failure, if this error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            VoiceError::NotFound { .. } => Some(404),
            VoiceError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parsed problem body of an API-level failure.
    pub fn api_error(&self) -> Option<&ApiErrorBody> {
        match self {
            VoiceError::NotFound { error, .. } | VoiceError::Api { error, .. } => error.as_ref(),
            _ => None,
        }
    }
}

/// Problem document returned by the Voice API on failures.
///
/// Newer endpoints follow RFC 7807 (`type`, `title`, `detail`, `instance`);
/// older ones send `error_title` instead of `title`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "error_title")]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
}

fn summarize(error: Option<&ApiErrorBody>, raw: &str) -> String {
    match error {
        Some(ApiErrorBody {
            title: Some(title),
            detail: Some(detail),
            ..
        }) => format!("{title}: {detail}"),
        Some(ApiErrorBody {
            title: Some(title), ..
        }) => title.clone(),
        _ => raw.to_string(),
    }
}

pub(crate) fn invalid_input(message: impl Into<String>) -> VoiceError {
    VoiceError::InvalidInput(message.into())
}

/// Rejects blank required string arguments.
pub(crate) fn ensure_not_blank(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid_input(format!("{name} must not be empty")));
    }
    Ok(())
}
