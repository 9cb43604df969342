//! JSON message bridge between the desktop window's page and native code.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::dialogs::{DEFAULT_SAVE_EXTENSION, DialogFilter, FileDialogService};
use crate::identity_api::{IdentityKind, check_identity};

/// Page-side function receiving replies.
pub const PAGE_RESOLVER: &str = "window.__qubicWallet";

/// Script installed in every page of the desktop window. Exposes
/// `window.__qubicWallet.invoke(action, payload)`, which returns a promise
/// settled by [`BridgeReply::to_script`].
pub const PAGE_BRIDGE_SCRIPT: &str = r#"
(function () {
  var pending = new Map();
  var nextId = 1;
  window.__qubicWallet = {
    invoke: function (action, payload) {
      var id = nextId++;
      return new Promise(function (resolve) {
        pending.set(id, resolve);
        window.ipc.postMessage(JSON.stringify({ id: id, action: action, payload: payload || {} }));
      });
    },
    resolve: function (reply) {
      var done = pending.get(reply.id);
      if (done) {
        pending.delete(reply.id);
        done(reply.result);
      }
    }
  };
})();
"#;

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: u64,
    action: String,
    #[serde(default)]
    payload: Value,
}

/// Payload of `dialog.open`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenFilePayload {
    /// Dialog title.
    pub title: String,
    /// Suggested directory or file path.
    #[serde(default)]
    pub default_path: String,
    /// Offered filters.
    #[serde(default)]
    pub filters: Vec<DialogFilter>,
}

/// Payload of `dialog.save`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFilePayload {
    /// Dialog title.
    pub title: String,
    /// Suggested directory or file path.
    #[serde(default)]
    pub default_path: String,
    /// Extension appended when the chosen name has none.
    #[serde(default = "default_save_extension")]
    pub default_extension: String,
    /// Offered filters.
    #[serde(default)]
    pub filters: Vec<DialogFilter>,
}

fn default_save_extension() -> String {
    DEFAULT_SAVE_EXTENSION.to_string()
}

/// Payload of `identity.validate`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityPayload {
    /// Raw field content.
    #[serde(default)]
    pub value: String,
    /// Validation rule.
    #[serde(default)]
    pub kind: IdentityKind,
}

/// Command requested by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    /// Show an open-file dialog.
    OpenFile(OpenFilePayload),
    /// Show a save-file dialog.
    SaveFile(SaveFilePayload),
    /// Validate an identity or destination field.
    ValidateIdentity(IdentityPayload),
}

/// Parsed page message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    /// Correlation id echoed in the reply.
    pub id: u64,
    /// Requested command.
    pub command: BridgeCommand,
}

/// Reply delivered back to the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeReply {
    /// Correlation id of the request.
    pub id: u64,
    /// Command result (`null` for a cancelled dialog).
    pub result: Value,
}

impl BridgeReply {
    /// Script that hands this reply to the page.
    pub fn to_script(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "null".to_string());
        format!("{PAGE_RESOLVER} && {PAGE_RESOLVER}.resolve({json});")
    }
}

/// Errors raised while parsing page messages.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Message is not valid JSON or lacks required fields.
    #[error("malformed bridge message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Action name is not recognized.
    #[error("unknown bridge action '{0}'")]
    UnknownAction(String),
}

/// Parses a raw message posted by the page.
///
/// # Errors
/// Returns [`BridgeError`] for malformed JSON, bad payloads, or unknown
/// actions.
pub fn parse_message(raw: &str) -> Result<BridgeRequest, BridgeError> {
    let message: RawMessage = serde_json::from_str(raw)?;
    let command = match message.action.as_str() {
        "dialog.open" => BridgeCommand::OpenFile(serde_json::from_value(message.payload)?),
        "dialog.save" => BridgeCommand::SaveFile(serde_json::from_value(message.payload)?),
        "identity.validate" => {
            BridgeCommand::ValidateIdentity(serde_json::from_value(message.payload)?)
        }
        other => return Err(BridgeError::UnknownAction(other.to_string())),
    };
    Ok(BridgeRequest {
        id: message.id,
        command,
    })
}

/// Executes `request`, delivering exactly one reply through `reply`.
///
/// Identity checks reply synchronously; dialogs reply from a pool worker
/// once the user answers.
pub fn dispatch(
    request: BridgeRequest,
    dialogs: &FileDialogService,
    reply: Arc<dyn Fn(BridgeReply) + Send + Sync>,
) {
    let id = request.id;
    match request.command {
        BridgeCommand::ValidateIdentity(payload) => {
            let check = check_identity(&payload.value, payload.kind);
            let result = serde_json::to_value(check).unwrap_or(Value::Null);
            reply(BridgeReply { id, result });
        }
        BridgeCommand::OpenFile(payload) => {
            dialogs.open_file_then(
                &payload.title,
                &payload.default_path,
                payload.filters,
                move |path| reply(path_reply(id, path)),
            );
        }
        BridgeCommand::SaveFile(payload) => {
            dialogs.save_file_then(
                &payload.title,
                &payload.default_path,
                &payload.default_extension,
                payload.filters,
                move |path| reply(path_reply(id, path)),
            );
        }
    }
}

fn path_reply(id: u64, path: Option<std::path::PathBuf>) -> BridgeReply {
    BridgeReply {
        id,
        result: path
            .map(|path| Value::String(path.to_string_lossy().into_owned()))
            .unwrap_or(Value::Null),
    }
}
