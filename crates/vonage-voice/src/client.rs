//! The Voice API client.

use std::{fmt, sync::Arc};

use bytes::Bytes;
use reqwest::{
    Method,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    audio::{LoopCount, StreamPayload, StreamResponse, TalkPayload, TalkResponse},
    auth::JwtAuth,
    call::{Call, CallEvent},
    call_info::{CallInfo, CallInfoPage, CallsFilter},
    config::{ClientConfig, DEFAULT_BASE_URL},
    dtmf::{DtmfPayload, DtmfResponse},
    error::{ApiErrorBody, Result, VoiceError, ensure_not_blank, invalid_input},
    modify::{CallModifier, ModifyCallAction, ModifyCallResponse, TransferDestination},
    transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport},
    voice_name::VoiceName,
};

const CALLS_PATH: [&str; 2] = ["v1", "calls"];

/// Client for the `/v1/calls` family of endpoints.
///
/// Every operation performs exactly one HTTP exchange with a freshly signed
/// bearer token. Nothing is retried and list results are never
/// auto-paginated.
#[derive(Clone)]
pub struct VoiceClient {
    auth: JwtAuth,
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl fmt::Debug for VoiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceClient")
            .field("auth", &self.auth)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl VoiceClient {
    /// Creates a client talking to the production API over [`reqwest`].
    pub fn new(auth: JwtAuth) -> Self {
        Self {
            auth,
            transport: Arc::new(ReqwestTransport::default()),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Builds a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The private key cannot be loaded or parsed
    /// - The base URL is invalid
    /// - The HTTP client cannot be initialized
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let auth = config.authenticator()?;
        let transport = ReqwestTransport::with_timeout(config.timeout())?;

        let client = Self::new(auth)
            .with_transport(transport)
            .with_base_url(&config.base_url)?;

        info!(
            application_id = %config.application_id,
            base_url = %client.base_url,
            "Voice client initialized"
        );
        Ok(client)
    }

    /// Replaces the transport, e.g. with a test double.
    #[must_use]
    pub fn with_transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Points the client at another API host.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty, unparsable or not HTTP(S).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Places an outbound call.
    ///
    /// # Errors
    ///
    /// Returns an error if the call is structurally invalid, the request
    /// fails, or the API rejects it.
    pub async fn create_call(&self, call: &Call) -> Result<CallEvent> {
        call.validate()?;
        let url = self.build_url(&[])?;
        self.send_json(Method::POST, url, Some(encode(call)?)).await
    }

    /// Lists call records; `None` leaves every filter at the server default.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn list_calls(&self, filter: Option<&CallsFilter>) -> Result<CallInfoPage> {
        let mut url = self.build_url(&[])?;
        if let Some(filter) = filter {
            let query = filter.to_query();
            if !query.is_empty() {
                url.query_pairs_mut().extend_pairs(query);
            }
        }
        self.send_json(Method::GET, url, None).await
    }

    /// Fetches a single call record.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::NotFound`] if the call does not exist, or any
    /// other request failure.
    pub async fn get_call_details(&self, uuid: &str) -> Result<CallInfo> {
        ensure_not_blank(uuid, "uuid")?;
        let url = self.build_url(&[uuid])?;
        self.send_json(Method::GET, url, None).await
    }

    /// Plays DTMF tones into a call.
    ///
    /// # Errors
    ///
    /// Returns an error if `digits` contains anything but `0-9*#p`, or if
    /// the request fails.
    pub async fn send_dtmf(&self, uuid: &str, digits: &str) -> Result<DtmfResponse> {
        ensure_not_blank(uuid, "uuid")?;
        let payload = DtmfPayload::new(digits)?;
        let url = self.build_url(&[uuid, "dtmf"])?;
        self.send_json(Method::PUT, url, Some(encode(&payload)?))
            .await
    }

    /// Applies `action` to the call identified by `uuid`.
    ///
    /// Equivalent to [`VoiceClient::modify_call_with`] with a
    /// [`CallModifier`] built from the same arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn modify_call(
        &self,
        uuid: &str,
        action: ModifyCallAction,
    ) -> Result<ModifyCallResponse> {
        self.modify_call_with(&CallModifier::new(uuid, action))
            .await
    }

    /// Applies a prepared [`CallModifier`].
    ///
    /// # Errors
    ///
    /// Returns an error if the modifier is invalid, the request fails, or
    /// the API rejects it.
    pub async fn modify_call_with(&self, modifier: &CallModifier) -> Result<ModifyCallResponse> {
        ensure_not_blank(modifier.uuid(), "uuid")?;
        if let ModifyCallAction::Transfer { destination } = modifier.action() {
            validate_destination(destination)?;
        }
        let url = self.build_url(&[modifier.uuid()])?;
        self.send_json(Method::PUT, url, Some(encode(modifier.action())?))
            .await
    }

    /// Transfers a call to a new NCCO, given by URL or inline.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination is empty, the request fails, or
    /// the API rejects it.
    pub async fn transfer_call(
        &self,
        uuid: &str,
        destination: impl Into<TransferDestination>,
    ) -> Result<ModifyCallResponse> {
        self.modify_call(uuid, ModifyCallAction::transfer(destination))
            .await
    }

    /// Streams an audio file into a call. `None` plays it once.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn start_stream(
        &self,
        uuid: &str,
        stream_url: &str,
        loop_count: Option<LoopCount>,
    ) -> Result<StreamResponse> {
        let payload = StreamPayload::new(stream_url).loop_count(loop_count.unwrap_or_default());
        self.start_stream_with(uuid, &payload).await
    }

    /// Streams audio using a fully specified payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn start_stream_with(
        &self,
        uuid: &str,
        payload: &StreamPayload,
    ) -> Result<StreamResponse> {
        ensure_not_blank(uuid, "uuid")?;
        ensure_not_blank(payload.stream_url(), "stream_url")?;
        let url = self.build_url(&[uuid, "stream"])?;
        self.send_json(Method::PUT, url, Some(encode(payload)?))
            .await
    }

    /// Stops any audio stream playing into a call.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn stop_stream(&self, uuid: &str) -> Result<StreamResponse> {
        ensure_not_blank(uuid, "uuid")?;
        let url = self.build_url(&[uuid, "stream"])?;
        self.send_json(Method::DELETE, url, None).await
    }

    /// Reads `text` into a call. Unset options fall back to the default
    /// voice and a single play.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn start_talk(
        &self,
        uuid: &str,
        text: &str,
        voice_name: Option<VoiceName>,
        loop_count: Option<LoopCount>,
    ) -> Result<TalkResponse> {
        let payload = TalkPayload::new(text)
            .voice_name(voice_name.unwrap_or_default())
            .loop_count(loop_count.unwrap_or_default());
        self.start_talk_with(uuid, &payload).await
    }

    /// Reads text into a call using a fully specified payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn start_talk_with(&self, uuid: &str, payload: &TalkPayload) -> Result<TalkResponse> {
        ensure_not_blank(uuid, "uuid")?;
        ensure_not_blank(payload.text(), "text")?;
        let url = self.build_url(&[uuid, "talk"])?;
        self.send_json(Method::PUT, url, Some(encode(payload)?))
            .await
    }

    /// Stops any speech playing into a call.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects it.
    pub async fn stop_talk(&self, uuid: &str) -> Result<TalkResponse> {
        ensure_not_blank(uuid, "uuid")?;
        let url = self.build_url(&[uuid, "talk"])?;
        self.send_json(Method::DELETE, url, None).await
    }

    /// Downloads a call recording from the absolute URL reported in a
    /// recording event.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not absolute HTTP(S), the request
    /// fails, or the API rejects it.
    pub async fn download_recording(&self, recording_url: &str) -> Result<Bytes> {
        ensure_not_blank(recording_url, "recording_url")?;
        let url = Url::parse(recording_url.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid_input(format!(
                "recording_url must be http(s), got {}",
                url.scheme()
            )));
        }

        let request = self.prepare(Method::GET, url, None)?;
        let response = self.execute(request).await?;
        Ok(response.body)
    }

    /// Builds `<base>/v1/calls/<segments..>`, escaping each segment.
    fn build_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| invalid_input(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(CALLS_PATH)
            .extend(segments);
        Ok(url)
    }

    /// Attaches a freshly signed token and content headers.
    fn prepare(&self, method: Method, url: Url, body: Option<Bytes>) -> Result<HttpRequest> {
        let bearer = self.auth.bearer()?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::try_from(bearer).map_err(|e| {
                invalid_input(format!("bearer token is not a valid header value: {e}"))
            })?,
        );
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Bytes>,
    ) -> Result<T> {
        let mut request = self.prepare(method, url, body)?;
        request
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));

        let response = self.execute(request).await?;
        decode(&response)
    }

    /// Runs one exchange and maps non-success statuses to errors.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.clone();
        let url = request.url.clone();
        debug!(method = %method, url = %url, "Calling Voice API");

        let response = self.transport.execute(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            warn!(
                method = %method,
                url = %url,
                status = response.status,
                "Voice API returned an error status"
            );
            Err(api_error(&url, &response))
        }
    }
}

fn encode<T: Serialize + ?Sized>(payload: &T) -> Result<Bytes> {
    serde_json::to_vec(payload)
        .map(Bytes::from)
        .map_err(VoiceError::Encode)
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    Ok(serde_json::from_slice(&response.body)?)
}

fn api_error(url: &Url, response: &HttpResponse) -> VoiceError {
    let raw = String::from_utf8_lossy(&response.body).into_owned();
    let error = serde_json::from_slice::<ApiErrorBody>(&response.body).ok();

    if response.status == 404 {
        VoiceError::NotFound {
            url: url.to_string(),
            error,
            raw,
        }
    } else {
        VoiceError::Api {
            status: response.status,
            error,
            raw,
        }
    }
}

fn validate_destination(destination: &TransferDestination) -> Result<()> {
    match destination {
        TransferDestination::Url(url) => ensure_not_blank(url, "transfer URL"),
        TransferDestination::Ncco(ncco) => ncco.ensure_not_empty("transfer NCCO"),
    }
}

/// Normalizes a base URL by trimming whitespace and trailing slashes.
///
/// # Errors
///
/// Returns an error if the URL is empty, unparsable or not HTTP(S).
fn normalize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(invalid_input("base URL must not be empty"));
    }
    let parsed = Url::parse(trimmed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid_input(format!(
            "base URL must be http(s), got {}",
            parsed.scheme()
        )));
    }
    Ok(trimmed.to_string())
}
