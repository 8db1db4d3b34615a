//! The action schema: a tagged command naming which downstream capability a
//! request targets.
//!
//! The wire shape is `{action, auth?, log?, send?}` where `action` selects
//! which payload field is meaningful. Decoding enforces the pairing as an
//! invariant: the tag must be recognized and exactly the one matching
//! payload must be present. Handlers downstream of [`Action::decode`] never
//! see an ambiguous request.

use serde::{Deserialize, Serialize};

use crate::json::{from_single_json_slice, SingleJsonError};

/// Credentials forwarded to the authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub email: String,
    pub password: String,
}

/// A log entry forwarded to the logging service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPayload {
    pub name: String,
    pub message: String,
}

/// An outbound mail request forwarded to the mail service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Action tag
// ---------------------------------------------------------------------------

/// The action tag, used as the routing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Authenticate,
    Log,
    Send,
}

impl ActionKind {
    /// The wire value of the `action` field.
    #[must_use]
    pub fn wire_tag(self) -> &'static str {
        match self {
            Self::Authenticate => "authentication",
            Self::Log => "logging",
            Self::Send => "send",
        }
    }

    /// Parses a wire tag. Returns `None` for unrecognized tags.
    #[must_use]
    pub fn from_wire_tag(tag: &str) -> Option<Self> {
        match tag {
            "authentication" => Some(Self::Authenticate),
            "logging" => Some(Self::Log),
            "send" => Some(Self::Send),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_tag())
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A decoded, validated action with its payload carried in the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Authenticate(AuthPayload),
    Log(LogPayload),
    Send(SendPayload),
}

/// Errors from decoding an inbound request into an [`Action`].
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The body was not a single well-formed JSON object, or the payload
    /// fields did not match the tag (absent, ambiguous, or mismatched).
    #[error("malformed request: {0}")]
    Malformed(String),
    /// The `action` field held an unrecognized tag.
    #[error("unknown action: {action}")]
    UnknownAction { action: String },
}

/// The raw wire shape before the tag/payload pairing is validated.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawRequest {
    action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth: Option<AuthPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    log: Option<LogPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    send: Option<SendPayload>,
}

impl Action {
    /// Decodes a request body into a validated `Action`.
    ///
    /// The body must be exactly one JSON object, the tag must be
    /// recognized, and exactly the payload field matching the tag must be
    /// populated.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Malformed`] for syntax errors, trailing
    /// values, and tag/payload mismatches; [`RequestError::UnknownAction`]
    /// for unrecognized tags.
    pub fn decode(body: &[u8]) -> Result<Self, RequestError> {
        let raw: RawRequest = from_single_json_slice(body).map_err(|e| match e {
            SingleJsonError::TrailingValue => {
                RequestError::Malformed("body must contain exactly one JSON object".into())
            }
            other => RequestError::Malformed(other.to_string()),
        })?;

        let Some(kind) = ActionKind::from_wire_tag(&raw.action) else {
            return Err(RequestError::UnknownAction { action: raw.action });
        };

        let populated =
            usize::from(raw.auth.is_some()) + usize::from(raw.log.is_some()) + usize::from(raw.send.is_some());
        if populated != 1 {
            return Err(RequestError::Malformed(format!(
                "expected exactly one payload field, found {populated}"
            )));
        }

        match (kind, raw.auth, raw.log, raw.send) {
            (ActionKind::Authenticate, Some(auth), None, None) => Ok(Self::Authenticate(auth)),
            (ActionKind::Log, None, Some(log), None) => Ok(Self::Log(log)),
            (ActionKind::Send, None, None, Some(send)) => Ok(Self::Send(send)),
            (kind, ..) => Err(RequestError::Malformed(format!(
                "payload does not match action tag {kind}"
            ))),
        }
    }

    /// The routing tag of this action.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Authenticate(_) => ActionKind::Authenticate,
            Self::Log(_) => ActionKind::Log,
            Self::Send(_) => ActionKind::Send,
        }
    }

    /// Serializes just the payload variant, as posted to downstream HTTP
    /// services.
    #[must_use]
    pub fn payload_value(&self) -> serde_json::Value {
        match self {
            Self::Authenticate(p) => serde_json::to_value(p),
            Self::Log(p) => serde_json::to_value(p),
            Self::Send(p) => serde_json::to_value(p),
        }
        .expect("payload structs serialize infallibly")
    }

    /// Re-serializes the full request envelope `{action, <payload>}`, as
    /// published to the queue.
    #[must_use]
    pub fn to_request_value(&self) -> serde_json::Value {
        let mut raw = RawRequest {
            action: self.kind().wire_tag().to_string(),
            ..RawRequest::default()
        };
        match self.clone() {
            Self::Authenticate(p) => raw.auth = Some(p),
            Self::Log(p) => raw.log = Some(p),
            Self::Send(p) => raw.send = Some(p),
        }
        serde_json::to_value(&raw).expect("request envelope serializes infallibly")
    }
}
