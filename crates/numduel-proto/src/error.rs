//! Protocol decode errors.

use thiserror::Error;

/// Errors produced while decoding a client frame.
///
/// The `Display` text is sent verbatim to the client inside an `error`
/// message, so it is phrased for players rather than operators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Frame is not valid JSON.
    #[error("Invalid JSON.")]
    InvalidJson,

    /// Frame is JSON but not an object with a `type` key.
    #[error("Missing message type.")]
    MissingType,

    /// Frame arrived as binary data.
    #[error("Expected a text message.")]
    BinaryFrame,
}
