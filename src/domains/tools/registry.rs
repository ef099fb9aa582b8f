//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry mapping tool names to descriptors and handlers
//! - Protocol-neutral invocation with parameter validation
//! - The catalog of built-in tools

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use super::definitions::{
    FindAndPlayTool, LibraryStatsTool, ListDownloadsTool, NavigateMenuTool, NowPlayingTool,
    PlayEpisodeTool, PlayFileTool, PlayMovieTool, PlayPauseTool, RecentMoviesTool,
    ScanLibraryTool, SearchDownloadsTool, SearchMoviesTool, SetVolumeTool, StopTool, TvShowsTool,
};
use super::error::ToolError;
use super::handlers::{ToolContext, ToolHandler, ToolParams, ToolResult};
use super::schema::ToolDescriptor;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Tool registry - manages all available tools.
///
/// Built once at startup and shared read-only by every transport.
pub struct ToolRegistry {
    context: ToolContext,
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry whose handlers receive `context`.
    pub fn new(context: ToolContext) -> Self {
        Self {
            context,
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool under its descriptor name.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: impl ToolHandler + 'static,
    ) -> Result<(), ToolError> {
        if self.index.contains_key(&descriptor.name) {
            return Err(ToolError::DuplicateTool(descriptor.name));
        }

        debug!("Registering tool: {}", descriptor.name);
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// All descriptors in registration order.
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor).collect()
    }

    /// Descriptor of a registered tool.
    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i].descriptor)
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.descriptor.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `arguments` and run the named tool.
    ///
    /// Every fault comes back as a `ToolError`, including handler panics.
    #[instrument(skip(self, arguments))]
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolResult {
        let Some(&slot) = self.index.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return Err(ToolError::unknown_tool(name));
        };
        let tool = &self.tools[slot];

        let params = ToolParams::new(tool.descriptor.validate(arguments)?);

        match AssertUnwindSafe(tool.handler.call(&self.context, params))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                error!("Tool {} panicked: {}", name, message);
                Err(ToolError::internal(message))
            }
        }
    }
}

/// Build the registry holding every built-in tool.
pub fn build_tool_registry(context: ToolContext) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new(context);

    registry.register(NowPlayingTool::descriptor(), NowPlayingTool)?;
    registry.register(PlayPauseTool::descriptor(), PlayPauseTool)?;
    registry.register(StopTool::descriptor(), StopTool)?;
    registry.register(SetVolumeTool::descriptor(), SetVolumeTool)?;
    registry.register(NavigateMenuTool::descriptor(), NavigateMenuTool)?;
    registry.register(SearchMoviesTool::descriptor(), SearchMoviesTool)?;
    registry.register(RecentMoviesTool::descriptor(), RecentMoviesTool)?;
    registry.register(TvShowsTool::descriptor(), TvShowsTool)?;
    registry.register(PlayMovieTool::descriptor(), PlayMovieTool)?;
    registry.register(PlayEpisodeTool::descriptor(), PlayEpisodeTool)?;
    registry.register(LibraryStatsTool::descriptor(), LibraryStatsTool)?;
    registry.register(ScanLibraryTool::descriptor(), ScanLibraryTool)?;
    registry.register(ListDownloadsTool::descriptor(), ListDownloadsTool)?;
    registry.register(PlayFileTool::descriptor(), PlayFileTool)?;
    registry.register(SearchDownloadsTool::descriptor(), SearchDownloadsTool)?;
    registry.register(FindAndPlayTool::descriptor(), FindAndPlayTool)?;

    debug!("Registered {} tools", registry.len());
    Ok(registry)
}
