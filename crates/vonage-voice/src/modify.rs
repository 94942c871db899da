//! In-progress call modification: hangup, mute, earmuff and transfer.

use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};

use crate::ncco::Ncco;

/// Where a transferred call fetches its next NCCO from.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferDestination {
    Url(String),
    Ncco(Ncco),
}

impl From<&str> for TransferDestination {
    fn from(url: &str) -> Self {
        TransferDestination::Url(url.to_string())
    }
}

impl From<String> for TransferDestination {
    fn from(url: String) -> Self {
        TransferDestination::Url(url)
    }
}

impl From<Ncco> for TransferDestination {
    fn from(ncco: Ncco) -> Self {
        TransferDestination::Ncco(ncco)
    }
}

/// Serialized as `{"type":"ncco","url":[..]}` or `{"type":"ncco","ncco":[..]}`.
impl Serialize for TransferDestination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TransferDestination", 2)?;
        state.serialize_field("type", "ncco")?;
        match self {
            TransferDestination::Url(url) => state.serialize_field("url", &[url])?,
            TransferDestination::Ncco(ncco) => state.serialize_field("ncco", ncco)?,
        }
        state.end()
    }
}

/// Action applied to an in-progress call, tagged by `action` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ModifyCallAction {
    Hangup,
    Mute,
    Unmute,
    Earmuff,
    Unearmuff,
    Transfer { destination: TransferDestination },
}

impl ModifyCallAction {
    pub fn transfer(destination: impl Into<TransferDestination>) -> Self {
        ModifyCallAction::Transfer {
            destination: destination.into(),
        }
    }
}

/// A modification addressed to a specific call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallModifier {
    uuid: String,
    action: ModifyCallAction,
}

impl CallModifier {
    pub fn new(uuid: impl Into<String>, action: ModifyCallAction) -> Self {
        Self {
            uuid: uuid.into(),
            action,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn action(&self) -> &ModifyCallAction {
        &self.action
    }
}

/// Acknowledgement of a modification. Some actions return no `uuid`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModifyCallResponse {
    pub message: String,
    #[serde(default)]
    pub uuid: Option<String>,
}
