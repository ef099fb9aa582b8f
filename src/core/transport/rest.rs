//! Plain REST adapter: one tool call per request.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::http::AppState;
use crate::domains::tools::{ToolError, ToolErrorKind, ToolOutput};

/// HTTP status for a tool envelope.
pub fn status_for(error_code: Option<ToolErrorKind>) -> StatusCode {
    match error_code {
        None => StatusCode::OK,
        Some(ToolErrorKind::UnknownTool | ToolErrorKind::NoMatchFound) => StatusCode::NOT_FOUND,
        Some(
            ToolErrorKind::MissingParameter
            | ToolErrorKind::InvalidParameterType
            | ToolErrorKind::InvalidParameterValue,
        ) => StatusCode::BAD_REQUEST,
        Some(ToolErrorKind::BackendError) => StatusCode::BAD_GATEWAY,
        Some(ToolErrorKind::BackendUnavailable | ToolErrorKind::DirectoryUnavailable) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        Some(ToolErrorKind::DuplicateTool | ToolErrorKind::InternalError) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `GET /tools`.
pub async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "server": state.server.name(),
        "transport": "rest",
        "tools": state.server.list_tools(),
    }))
}

/// Extract call parameters from an optional `{"params": {...}}` body.
fn params_from_body(body: &str) -> Result<Value, ToolError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(mut object)) => Ok(object.remove("params").unwrap_or(Value::Null)),
        Ok(Value::Null) => Ok(Value::Null),
        Ok(_) => Err(ToolError::InvalidParameterType(
            "request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(ToolError::InvalidParameterType(format!(
            "request body is not valid JSON: {}",
            e
        ))),
    }
}

/// `POST /tools/{name}`.
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: String,
) -> impl IntoResponse {
    let output = match params_from_body(&body) {
        Ok(params) => {
            info!("REST call: {}", name);
            state.server.call_tool(&name, params).await
        }
        Err(e) => {
            warn!("Rejected REST body for {}: {}", name, e);
            ToolOutput::failure(&name, &e, 0)
        }
    };

    (status_for(output.error_code), Json(output))
}
