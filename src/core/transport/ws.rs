//! WebSocket adapter.
//!
//! Each text frame is one JSON-RPC message handled exactly like a
//! `POST /mcp` body. Tool events are forwarded as JSON-RPC notifications.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::http::AppState;
use super::rpc::{JsonRpcResponse, dispatch};
use crate::core::McpServer;
use crate::core::events::ServerEvent;

/// Method name of forwarded tool events.
pub const TOOL_EXECUTED_METHOD: &str = "notifications/tools/tool_executed";

/// `GET /ws`.
pub async fn handle_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state.server))
}

fn notification(event: &ServerEvent) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": TOOL_EXECUTED_METHOD,
        "params": event,
    })
}

async fn reply_to(server: &McpServer, text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(message) => dispatch(server, message).await,
        Err(e) => Some(JsonRpcResponse::parse_error(e).to_value()),
    }
}

async fn serve_socket(socket: WebSocket, server: McpServer) {
    info!("WebSocket client connected");
    let (mut sender, mut receiver) = socket.split();
    let mut events = server.events().subscribe();

    loop {
        let outgoing = tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => reply_to(&server, text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => None,
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
            },
            event = events.recv() => match event {
                Ok(event) => Some(notification(&event)),
                Err(RecvError::Lagged(skipped)) => {
                    debug!("WebSocket client skipped {} events", skipped);
                    None
                }
                Err(RecvError::Closed) => break,
            },
        };

        if let Some(value) = outgoing {
            if sender.send(Message::Text(value.to_string().into())).await.is_err() {
                break;
            }
        }
    }

    info!("WebSocket client disconnected");
}
