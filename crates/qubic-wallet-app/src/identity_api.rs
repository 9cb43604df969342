//! Identity validation exposed to the UI over HTTP and the window bridge.

use qubic_wallet_identity::{IdentityValidator, QubicChecksum};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Route answering identity validation queries in server mode.
pub const VALIDATE_ROUTE: &str = "/api/identity/validate";

/// Which validation rule applies to the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    /// Full 60-letter identity.
    #[default]
    Identity,
    /// Identity or contract slot index.
    Destination,
}

impl IdentityKind {
    fn from_query(value: &str) -> Option<Self> {
        match value {
            "identity" => Some(Self::Identity),
            "destination" => Some(Self::Destination),
            _ => None,
        }
    }
}

/// Validation result rendered for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityCheck {
    /// User-facing message, absent when the input is acceptable.
    pub error: Option<String>,
    /// CSS class for the input field.
    pub css_class: &'static str,
}

/// Validates `value` under `kind`.
pub fn check_identity(value: &str, kind: IdentityKind) -> IdentityCheck {
    let validator = IdentityValidator::<QubicChecksum>::default();
    let (issue, class) = match kind {
        IdentityKind::Identity => (validator.validate(value), validator.css_class(value)),
        IdentityKind::Destination => (
            validator.validate_destination(value),
            validator.dest_css_class(value),
        ),
    };
    IdentityCheck {
        error: issue.map(|issue| issue.to_string()),
        css_class: class.css_token(),
    }
}

/// Parses the query string of a validation request.
///
/// Missing `value` is treated as empty input. Returns `None` for an unknown
/// `kind`.
pub fn check_from_query(query: &str) -> Option<IdentityCheck> {
    let mut value = String::new();
    let mut kind = IdentityKind::default();
    for (name, raw) in form_urlencoded::parse(query.as_bytes()) {
        match name.as_ref() {
            "value" => value = raw.into_owned(),
            "kind" => kind = IdentityKind::from_query(&raw)?,
            _ => {}
        }
    }
    Some(check_identity(&value, kind))
}
