//! Media center client error types.

use thiserror::Error;

/// Errors surfaced by the media center client.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The media center could not be reached (connection, timeout, HTTP status).
    #[error("Media center unavailable: {0}")]
    Unavailable(String),

    /// The media center answered with a JSON-RPC error.
    #[error("Media center error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The reply could not be decoded.
    #[error("Invalid response from media center: {0}")]
    InvalidResponse(String),

    /// A player command was sent while nothing is playing.
    #[error("No active player")]
    NoActivePlayer,

    /// A library item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl BackendError {
    /// Create an "unavailable" error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an "invalid response" error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
