//! The uniform response envelope every gateway path converges to.
//!
//! Regardless of which transport served a request, the caller always
//! receives `{error, message, data?}`. Downstream HTTP services reply with
//! the same shape, so this type is used on both sides of the blocking
//! transport.

use serde::{Deserialize, Serialize};

/// The single outbound response shape: a failure flag, a human-readable
/// message, and an optional opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    /// A successful envelope carrying an optional downstream payload.
    #[must_use]
    pub fn success(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            error: false,
            message: message.into(),
            data,
        }
    }

    /// A failed envelope. Failure envelopes never carry data.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_serializes_without_null_data() {
        let env = Envelope::success("Authenticated", None);
        let out = serde_json::to_value(&env).unwrap();
        assert_eq!(out, json!({"error": false, "message": "Authenticated"}));
    }

    #[test]
    fn success_envelope_carries_data_through() {
        let env = Envelope::success("Logged", Some(json!({"id": 7})));
        let out = serde_json::to_value(&env).unwrap();
        assert_eq!(out["data"]["id"], 7);
    }

    #[test]
    fn failure_envelope_sets_error_flag() {
        let env = Envelope::failure("Authentication failed");
        assert!(env.error);
        assert!(env.data.is_none());
    }

    #[test]
    fn deserializes_downstream_reply_with_absent_data() {
        let env: Envelope =
            serde_json::from_str(r#"{"error": false, "message": "Email Sent"}"#).unwrap();
        assert!(!env.error);
        assert_eq!(env.message, "Email Sent");
        assert!(env.data.is_none());
    }

    #[test]
    fn deserializes_explicit_null_data_as_none() {
        let env: Envelope =
            serde_json::from_str(r#"{"error": false, "message": "ok", "data": null}"#).unwrap();
        assert!(env.data.is_none());
    }
}
