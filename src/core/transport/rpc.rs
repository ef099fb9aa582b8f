//! JSON-RPC 2.0 adapter for the MCP tool protocol.
//!
//! Shared by `POST /mcp` and the WebSocket endpoint. A message is either a
//! single request or a batch; notifications (no `id`) never get a reply.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::http::AppState;
use crate::core::McpServer;
use crate::domains::tools::{ToolDescriptor, ToolErrorKind, ToolOutput};

/// MCP protocol version announced during `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// ============================================================================
// JSON-RPC Error Codes
// ============================================================================

pub const PARSE_ERROR: i32 = -32_700;
pub const INVALID_REQUEST: i32 = -32_600;
pub const METHOD_NOT_FOUND: i32 = -32_601;
pub const INVALID_PARAMS: i32 = -32_602;
pub const INTERNAL_ERROR: i32 = -32_603;

// ============================================================================
// JSON-RPC Messages
// ============================================================================

/// JSON-RPC request structure.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Attach structured data to an error response.
    pub fn with_data(mut self, data: Value) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.data = Some(data);
        }
        self
    }

    pub fn parse_error(msg: impl std::fmt::Display) -> Self {
        Self::error(None, PARSE_ERROR, format!("Parse error: {}", msg))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            json!({
                "jsonrpc": "2.0",
                "id": self.id,
                "error": { "code": INTERNAL_ERROR, "message": e.to_string() },
            })
        })
    }
}

/// MCP listing entry for one tool.
pub fn tool_listing(descriptor: &ToolDescriptor) -> Value {
    json!({
        "name": descriptor.name,
        "description": descriptor.description,
        "inputSchema": descriptor.input_schema(),
    })
}

// ============================================================================
// Dispatch
// ============================================================================

/// Handle one decoded JSON-RPC message (single request or batch).
///
/// Returns `None` when nothing must be sent back.
pub async fn dispatch(server: &McpServer, message: Value) -> Option<Value> {
    match message {
        Value::Array(batch) if batch.is_empty() => Some(
            JsonRpcResponse::error(None, INVALID_REQUEST, "Empty batch").to_value(),
        ),
        Value::Array(batch) => {
            debug!("Processing batch of {} messages", batch.len());
            let replies: Vec<Value> = join_all(batch.into_iter().map(|m| handle_message(server, m)))
                .await
                .into_iter()
                .flatten()
                .map(|r| r.to_value())
                .collect();
            (!replies.is_empty()).then_some(Value::Array(replies))
        }
        single => handle_message(server, single).await.map(|r| r.to_value()),
    }
}

async fn handle_message(server: &McpServer, message: Value) -> Option<JsonRpcResponse> {
    // Echo the caller's id even when the rest of the request is malformed.
    let id = message.get("id").filter(|id| !id.is_null()).cloned();
    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            return Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid Request: {}", e),
            ));
        }
    };

    let is_notification = request.id.is_none();
    let response = process_request(server, request).await;
    if is_notification { None } else { response }
}

/// Process a JSON-RPC request and return the response.
#[instrument(skip_all, fields(method = %request.method))]
async fn process_request(server: &McpServer, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    // Validate JSON-RPC version
    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::error(
            request.id,
            INVALID_REQUEST,
            "Invalid Request: jsonrpc must be \"2.0\"",
        ));
    }

    let id = request.id.clone();
    let response = match request.method.as_str() {
        "initialize" => handle_initialize(server, id),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => handle_tools_list(server, id),
        "tools/call" => handle_tools_call(server, id, request.params).await,

        // Notifications (no response)
        method if method.starts_with("notifications/") => {
            info!("Received notification: {}", method);
            return None;
        }

        method => {
            warn!("Unknown method: {}", method);
            JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
        }
    };
    Some(response)
}

fn handle_initialize(server: &McpServer, id: Option<Value>) -> JsonRpcResponse {
    info!("Processing initialize request");

    JsonRpcResponse::success(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": server.name(),
                "version": server.version()
            },
            "instructions": "Remote control for a Kodi media center. Call tools/list for the catalog."
        }),
    )
}

fn handle_tools_list(server: &McpServer, id: Option<Value>) -> JsonRpcResponse {
    let tools: Vec<Value> = server.list_tools().into_iter().map(tool_listing).collect();
    JsonRpcResponse::success(id, json!({ "tools": tools }))
}

async fn handle_tools_call(
    server: &McpServer,
    id: Option<Value>,
    params: Option<Value>,
) -> JsonRpcResponse {
    let params = params.unwrap_or(Value::Null);

    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing tool name");
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    let output = server.call_tool(name, arguments).await;
    call_response(id, output)
}

/// Map a tool envelope onto a `tools/call` reply.
fn call_response(id: Option<Value>, output: ToolOutput) -> JsonRpcResponse {
    if let Some(kind) = output.error_code {
        let code = match kind {
            ToolErrorKind::UnknownTool => Some(METHOD_NOT_FOUND),
            kind if kind.is_request_error() => Some(INVALID_PARAMS),
            _ => None,
        };
        if let Some(code) = code {
            let message = output.error.clone().unwrap_or_else(|| kind.as_str().to_string());
            return JsonRpcResponse::error(id, code, message)
                .with_data(json!({ "error_code": kind, "tool": output.tool }));
        }
    }

    let text = serde_json::to_string_pretty(&output).unwrap_or_default();
    JsonRpcResponse::success(
        id,
        json!({
            "content": [{ "type": "text", "text": text }],
            "structuredContent": output,
            "isError": !output.success,
        }),
    )
}

// ============================================================================
// HTTP endpoint
// ============================================================================

/// `POST /mcp`.
pub async fn handle_rpc(State(state): State<AppState>, body: String) -> Response {
    let message: Value = match serde_json::from_str(&body) {
        Ok(message) => message,
        Err(e) => {
            warn!("Failed to parse JSON-RPC body: {}", e);
            return Json(JsonRpcResponse::parse_error(e)).into_response();
        }
    };

    match dispatch(&state.server, message).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
