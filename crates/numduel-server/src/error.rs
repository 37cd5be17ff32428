//! Server error types.

use thiserror::Error;

/// Errors that stop the server.
///
/// Per-message failures never reach this type; they are answered on the
/// socket by the room registry.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport/network error
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
