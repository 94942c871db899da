//! Typed client for the Vonage Voice API.
//!
//! [`VoiceClient`] covers the `/v1/calls` endpoints: placing calls, listing
//! and inspecting call records, modifying live calls, and injecting DTMF,
//! audio streams and text-to-speech. Each request is authenticated with a
//! short-lived RS256 JWT signed by [`JwtAuth`].
//!
//! ```no_run
//! use vonage_voice::{Call, ClientConfig, VoiceClient};
//!
//! # async fn run() -> vonage_voice::Result<()> {
//! let config = ClientConfig::resolve()?.expect("vonage.toml not found");
//! let client = VoiceClient::from_config(&config)?;
//!
//! let event = client
//!     .create_call(&Call::new(
//!         "447700900903",
//!         "447700900904",
//!         "https://example.com/answer",
//!     ))
//!     .await?;
//! println!("call {} is {}", event.conversation_uuid, event.status.as_str());
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod auth;
pub mod call;
pub mod call_info;
mod client;
pub mod config;
pub mod dtmf;
mod error;
pub mod modify;
pub mod ncco;
pub mod transport;
pub mod voice_name;

pub use audio::{LoopCount, StreamPayload, StreamResponse, TalkPayload, TalkResponse};
pub use auth::{AuthError, Claims, Clock, FixedClock, JwtAuth, SystemClock};
pub use call::{
    AnswerTarget, Call, CallDirection, CallEvent, CallStatus, Endpoint, HttpMethod,
    MachineDetection,
};
pub use call_info::{CallInfo, CallInfoPage, CallsFilter, CallsFilterBuilder, Link, Links, Order};
pub use client::VoiceClient;
pub use config::{ClientConfig, ConfigError};
pub use dtmf::{DtmfPayload, DtmfResponse};
pub use error::{ApiErrorBody, Result, VoiceError};
pub use modify::{CallModifier, ModifyCallAction, ModifyCallResponse, TransferDestination};
pub use ncco::{Ncco, NccoAction, StreamAction, TalkAction};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use voice_name::VoiceName;
