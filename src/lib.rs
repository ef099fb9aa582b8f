//! Kodi MCP Server Library
//!
//! Remote-control tools for a Kodi media center, exposed identically over
//! REST, MCP JSON-RPC, Server-Sent Events, WebSocket and stdio.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the `McpServer` facade, event
//!   fan-out and the transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: the tool registry and the tool catalog
//!   - **media**: best-match search over the downloads directory
//!   - **backend**: the Kodi JSON-RPC client
//!
//! # Example
//!
//! ```rust,no_run
//! use kodi_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::from_config(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
