//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server,
//! including error handling, configuration, the server facade, event
//! fan-out and transport layer abstractions.

pub mod config;
pub mod error;
pub mod events;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{EventHub, ServerEvent};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
