//! Tool handler contract and execution envelope.
//!
//! A handler receives validated parameters and a `ToolContext` giving it the
//! media center client and the downloads library. It returns a `ToolResult`;
//! the server wraps that into a `ToolOutput` envelope which every transport
//! renders unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{ToolError, ToolErrorKind};
use crate::domains::backend::MediaCenter;
use crate::domains::media::MediaLibrary;

/// Outcome of a single tool invocation.
pub type ToolResult = Result<Value, ToolError>;

/// Output envelope of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Name of the invoked tool.
    pub tool: String,

    /// Whether the execution was successful.
    pub success: bool,

    /// The result data from the tool (`null` on failure).
    pub data: Value,

    /// Error message if execution failed.
    pub error: Option<String>,

    /// Machine-readable failure kind.
    pub error_code: Option<ToolErrorKind>,

    /// Wall-clock execution time.
    pub duration_ms: u64,
}

impl ToolOutput {
    /// Create a successful tool output.
    pub fn success(tool: impl Into<String>, data: Value, duration_ms: u64) -> Self {
        Self {
            tool: tool.into(),
            success: true,
            data,
            error: None,
            error_code: None,
            duration_ms,
        }
    }

    /// Create a failed tool output.
    pub fn failure(tool: impl Into<String>, error: &ToolError, duration_ms: u64) -> Self {
        Self {
            tool: tool.into(),
            success: false,
            data: Value::Null,
            error: Some(error.to_string()),
            error_code: Some(error.kind()),
            duration_ms,
        }
    }

    pub fn from_result(tool: impl Into<String>, result: &ToolResult, duration_ms: u64) -> Self {
        match result {
            Ok(data) => Self::success(tool, data.clone(), duration_ms),
            Err(e) => Self::failure(tool, e, duration_ms),
        }
    }
}

/// Validated parameters of a tool call, defaults already applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolParams(Map<String, Value>);

impl ToolParams {
    pub fn new(params: Map<String, Value>) -> Self {
        Self(params)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Deserialize into a typed parameter struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| ToolError::InvalidParameterType(e.to_string()))
    }
}

/// Collaborators available to every handler.
#[derive(Clone)]
pub struct ToolContext {
    pub backend: Arc<dyn MediaCenter>,
    pub library: MediaLibrary,
}

impl ToolContext {
    pub fn new(backend: Arc<dyn MediaCenter>, library: MediaLibrary) -> Self {
        Self { backend, library }
    }
}

/// Executable behavior of one tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with validated parameters.
    async fn call(&self, ctx: &ToolContext, params: ToolParams) -> ToolResult;
}
