//! Switchyard Core — action schema, response envelope, and strict JSON decoding.

pub mod action;
pub mod envelope;
pub mod json;

pub use action::{Action, ActionKind, AuthPayload, LogPayload, RequestError, SendPayload};
pub use envelope::Envelope;
pub use json::{from_single_json_slice, SingleJsonError};
