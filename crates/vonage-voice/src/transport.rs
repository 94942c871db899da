//! HTTP transport seam.
//!
//! [`VoiceClient`](crate::VoiceClient) never talks to an HTTP library
//! directly: it hands a fully prepared [`HttpRequest`] to an
//! [`HttpTransport`] and gets back the status code and raw body. The default
//! implementation, [`ReqwestTransport`], is a thin adapter over
//! [`reqwest::Client`]; tests substitute their own implementation returning
//! canned responses.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, header::HeaderMap};
use tracing::debug;
use url::Url;

/// Errors raised by a transport before an HTTP response was obtained.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Failure reported by a non-reqwest transport.
    #[error("transport failure: {0}")]
    Other(String),
}

/// A request ready to be put on the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Status code and raw body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes a single HTTP exchange.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and returns whatever the server answered.
    ///
    /// Non-success statuses are not errors at this layer.
    ///
    /// # Errors
    ///
    /// Returns an error only if no response could be obtained.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Builds a client that aborts exchanges exceeding `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be initialized (for
    /// example when no TLS backend is available).
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url, "Sending HTTP request");

        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        debug!(status, bytes = body.len(), "Received HTTP response");
        Ok(HttpResponse { status, body })
    }
}
