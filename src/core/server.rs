//! MCP Server implementation and lifecycle management.
//!
//! `McpServer` is the facade every transport talks to. It owns the tool
//! registry, times each call, wraps the outcome into a `ToolOutput` envelope
//! and publishes a `tool_executed` event.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` and registered in
//! `build_tool_registry`. **Adding a new tool does NOT require modifying this
//! file!**

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, instrument, warn};

use super::config::Config;
use super::error::Result;
use super::events::{EventHub, ServerEvent};
use crate::domains::backend::{KodiClient, MediaCenter};
use crate::domains::media::MediaLibrary;
use crate::domains::tools::{
    ToolContext, ToolDescriptor, ToolOutput, ToolRegistry, build_tool_registry,
};

/// The main MCP server handler.
///
/// Cheap to clone; all clones share the registry and the event hub.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Immutable after construction.
    registry: Arc<ToolRegistry>,

    /// Media center client, also reachable by tools through the registry.
    backend: Arc<dyn MediaCenter>,

    events: EventHub,
}

impl McpServer {
    /// Create a server around an already built registry.
    pub fn new(config: Config, registry: ToolRegistry, backend: Arc<dyn MediaCenter>) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            backend,
            events: EventHub::new(),
        }
    }

    /// Create a server talking to the configured Kodi instance.
    pub fn from_config(config: Config) -> Result<Self> {
        let backend: Arc<dyn MediaCenter> = Arc::new(KodiClient::new(&config.backend)?);
        let library = MediaLibrary::new(config.media.downloads_path.clone());
        let registry = build_tool_registry(ToolContext::new(backend.clone(), library))?;

        info!(
            "Registered {} tools, downloads root {}",
            registry.len(),
            config.media.downloads_path.display()
        );
        Ok(Self::new(config, registry, backend))
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// All tool descriptors in registration order.
    pub fn list_tools(&self) -> Vec<&ToolDescriptor> {
        self.registry.list()
    }

    /// Call a tool by name.
    ///
    /// Never fails: every outcome, including unknown tools, comes back as an
    /// envelope. A `tool_executed` event is published for each call.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> ToolOutput {
        let output = self.execute(name, arguments).await;
        self.events.publish(ServerEvent::tool_executed(&output));
        output
    }

    /// Call a tool without publishing an event (periodic polling).
    pub async fn poll_tool(&self, name: &str, arguments: Value) -> ToolOutput {
        self.execute(name, arguments).await
    }

    #[instrument(skip(self, arguments))]
    async fn execute(&self, name: &str, arguments: Value) -> ToolOutput {
        let started = Instant::now();
        let result = self.registry.invoke(name, arguments).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let output = ToolOutput::from_result(name, &result, duration_ms);
        match &output.error {
            None => info!("Tool {} succeeded in {} ms", name, duration_ms),
            Some(error) => warn!("Tool {} failed in {} ms: {}", name, duration_ms, error),
        }
        output
    }

    /// Whether the media center currently answers.
    pub async fn backend_healthy(&self) -> bool {
        match self.backend.ping().await {
            Ok(alive) => alive,
            Err(e) => {
                warn!("Media center health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(feature = "stdio")]
mod mcp {
    //! rmcp `ServerHandler` delegating to the registry.

    use std::sync::Arc;

    use rmcp::{
        ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
    };
    use serde_json::{Value, json};
    use tracing::{info, instrument};

    use super::McpServer;
    use crate::domains::tools::{ToolDescriptor, ToolErrorKind};

    fn to_tool(descriptor: &ToolDescriptor) -> Tool {
        Tool {
            name: descriptor.name.clone().into(),
            description: Some(descriptor.description.clone().into()),
            input_schema: Arc::new(descriptor.input_schema().clone()),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    impl ServerHandler for McpServer {
        fn get_info(&self) -> ServerInfo {
            ServerInfo {
                instructions: Some(
                    "Remote control for a Kodi media center: playback, library browsing and \
                     best-match playback of downloaded files."
                        .to_string(),
                ),
                capabilities: ServerCapabilities::builder().enable_tools().build(),
                ..Default::default()
            }
        }

        #[instrument(skip(self, _context))]
        async fn list_tools(
            &self,
            _request: Option<PaginatedRequestParam>,
            _context: RequestContext<RoleServer>,
        ) -> Result<ListToolsResult, McpError> {
            info!("Listing tools");
            Ok(ListToolsResult {
                tools: self.list_tools().into_iter().map(to_tool).collect(),
                next_cursor: None,
                meta: None,
            })
        }

        #[instrument(skip(self, request, _context), fields(tool = %request.name))]
        async fn call_tool(
            &self,
            request: CallToolRequestParam,
            _context: RequestContext<RoleServer>,
        ) -> Result<CallToolResult, McpError> {
            let arguments = request.arguments.map(Value::Object).unwrap_or(Value::Null);
            let output = McpServer::call_tool(self, &request.name, arguments).await;

            if let Some(kind) = output.error_code {
                if kind == ToolErrorKind::UnknownTool || kind.is_request_error() {
                    return Err(McpError::invalid_params(
                        output.error.unwrap_or_default(),
                        Some(json!({ "error_code": kind })),
                    ));
                }
            }

            let text = serde_json::to_string_pretty(&output)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            if output.success {
                Ok(CallToolResult::success(vec![Content::text(text)]))
            } else {
                Ok(CallToolResult::error(vec![Content::text(text)]))
            }
        }
    }
}
