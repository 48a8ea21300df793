//! Textual interchange encoding for controller payloads.
//!
//! Domain objects cross the RPC boundary and reach the cloud store as
//! UTF-8 JSON bytes. Decoding a malformed payload fails with a distinct
//! error; a partially populated object is never returned.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Error type for payload encode/decode operations
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// A value could not be encoded
    #[error("Serialization failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// A payload could not be decoded into the expected type
    #[error("Deserialization failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encode a value into payload bytes.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as JSON.
pub fn to_payload<T: Serialize>(value: &T) -> Result<Bytes, SerializeError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(SerializeError::Encode)
}

/// Decode payload bytes into a value.
///
/// # Errors
///
/// Returns an error if the payload is not valid JSON for the expected type.
pub fn from_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T, SerializeError> {
    serde_json::from_slice(payload).map_err(SerializeError::Decode)
}
