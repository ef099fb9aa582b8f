//! HTTP transport implementation.
//!
//! One axum router serves every network adapter:
//! - REST: `GET /tools`, `POST /tools/{name}`
//! - JSON-RPC (MCP): `POST /mcp`
//! - Server-Sent Events: `GET /sse`
//! - WebSocket: `GET /ws`
//!
//! All of them share the same `McpServer` and therefore the same registry.

use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::config::HttpConfig;
use super::{TransportError, TransportResult, rest, rpc, sse, ws};
use crate::core::McpServer;

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance.
    pub server: McpServer,

    /// Period of `playback_state` events on `/sse`.
    pub sse_interval: Duration,
}

/// Build the router for all HTTP adapters.
pub fn build_router(server: McpServer, config: &HttpConfig) -> Router {
    let state = AppState {
        server,
        sse_interval: Duration::from_secs(config.sse_interval_secs.max(1)),
    };

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/tools", get(rest::list_tools))
        .route("/tools/{name}", post(rest::call_tool))
        .route("/mcp", post(rpc::handle_rpc))
        .route("/sse", get(sse::handle_sse))
        .route("/ws", get(ws::handle_ws))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    }
}

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = build_router(server, &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (CORS {})", addr, cors_status);
        info!("  → REST:      GET /tools, POST /tools/{{name}}");
        info!("  → JSON-RPC:  POST /mcp");
        info!("  → SSE:       GET /sse");
        info!("  → WebSocket: GET /ws");
        info!("  → Health:    GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "tools": state.server.list_tools().len(),
        "endpoints": {
            "rest": "/tools",
            "rpc": "/mcp",
            "sse": "/sse",
            "websocket": "/ws",
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0"
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let backend_up = state.server.backend_healthy().await;
    Json(serde_json::json!({
        "status": if backend_up { "ok" } else { "degraded" },
        "backend": if backend_up { "ok" } else { "down" },
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
