//! Strict JSON decoding: a body must contain exactly one JSON value.
//!
//! The gateway enforces the same contract on inbound request bodies and on
//! downstream HTTP responses: one well-formed JSON value, nothing after it.
//! Trailing data after the first value is a protocol violation, not
//! ignorable noise.

use serde::de::DeserializeOwned;

/// Errors from strict single-value decoding.
#[derive(Debug, thiserror::Error)]
pub enum SingleJsonError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("body is empty")]
    Empty,
    #[error("body must contain exactly one JSON value")]
    TrailingValue,
}

/// Decodes exactly one JSON value of type `T` from `bytes`.
///
/// # Errors
///
/// Returns `SingleJsonError::Empty` for an empty (or whitespace-only) body,
/// `Syntax` when the first value fails to parse as `T`, and
/// `TrailingValue` when any second value follows the first.
pub fn from_single_json_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SingleJsonError> {
    let mut stream = serde_json::Deserializer::from_slice(bytes).into_iter::<T>();

    let first = match stream.next() {
        Some(value) => value?,
        None => return Err(SingleJsonError::Empty),
    };

    // A second item -- well-formed or not -- means the body held more than
    // one value.
    if stream.next().is_some() {
        return Err(SingleJsonError::TrailingValue);
    }

    Ok(first)
}
