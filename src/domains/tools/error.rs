//! Tool-specific error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domains::backend::BackendError;
use crate::domains::media::MediaError;

/// Machine-readable failure kind carried in every failure envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolErrorKind {
    UnknownTool,
    MissingParameter,
    InvalidParameterType,
    InvalidParameterValue,
    DuplicateTool,
    DirectoryUnavailable,
    NoMatchFound,
    BackendUnavailable,
    BackendError,
    InternalError,
}

impl ToolErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownTool => "UNKNOWN_TOOL",
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::InvalidParameterType => "INVALID_PARAMETER_TYPE",
            Self::InvalidParameterValue => "INVALID_PARAMETER_VALUE",
            Self::DuplicateTool => "DUPLICATE_TOOL",
            Self::DirectoryUnavailable => "DIRECTORY_UNAVAILABLE",
            Self::NoMatchFound => "NO_MATCH_FOUND",
            Self::BackendUnavailable => "BACKEND_UNAVAILABLE",
            Self::BackendError => "BACKEND_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Failures caused by the request itself rather than by execution.
    pub fn is_request_error(self) -> bool {
        matches!(
            self,
            Self::MissingParameter | Self::InvalidParameterType | Self::InvalidParameterValue
        )
    }
}

/// Errors that can occur during tool operations.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A required parameter was not supplied.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// A parameter has the wrong JSON type.
    #[error("Invalid parameter type: {0}")]
    InvalidParameterType(String),

    /// A parameter is out of its declared range or allowed set.
    #[error("Invalid parameter value: {0}")]
    InvalidParameterValue(String),

    /// A tool with the same name is already registered.
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// The media directory could not be read.
    #[error("{0}")]
    DirectoryUnavailable(String),

    /// Matching found no eligible file.
    #[error("{0}")]
    NoMatchFound(String),

    /// The media center could not be reached.
    #[error("{0}")]
    BackendUnavailable(String),

    /// The media center rejected or failed the request.
    #[error("{0}")]
    Backend(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "unknown tool" error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    /// Create a new "invalid parameter value" error.
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidParameterValue(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The machine-readable kind of this error.
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            Self::UnknownTool(_) => ToolErrorKind::UnknownTool,
            Self::MissingParameter(_) => ToolErrorKind::MissingParameter,
            Self::InvalidParameterType(_) => ToolErrorKind::InvalidParameterType,
            Self::InvalidParameterValue(_) => ToolErrorKind::InvalidParameterValue,
            Self::DuplicateTool(_) => ToolErrorKind::DuplicateTool,
            Self::DirectoryUnavailable(_) => ToolErrorKind::DirectoryUnavailable,
            Self::NoMatchFound(_) => ToolErrorKind::NoMatchFound,
            Self::BackendUnavailable(_) => ToolErrorKind::BackendUnavailable,
            Self::Backend(_) => ToolErrorKind::BackendError,
            Self::Internal(_) => ToolErrorKind::InternalError,
        }
    }
}

impl From<BackendError> for ToolError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Unavailable(_) => Self::BackendUnavailable(e.to_string()),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<MediaError> for ToolError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::DirectoryUnavailable { .. } => Self::DirectoryUnavailable(e.to_string()),
            MediaError::NoMatchFound { .. } => Self::NoMatchFound(e.to_string()),
            MediaError::EmptyQuery => Self::InvalidParameterValue(e.to_string()),
        }
    }
}
