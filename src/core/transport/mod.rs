//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **STDIO**: Standard input/output via rmcp - feature: `stdio`
//! - **HTTP**: REST, JSON-RPC, SSE and WebSocket on one listener - feature: `http`
//!
//! Each transport handles the connection lifecycle and delegates tool calls
//! to the shared `McpServer`.

pub(crate) mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub mod rest;

#[cfg(feature = "http")]
pub mod rpc;

#[cfg(feature = "http")]
pub mod sse;

#[cfg(feature = "http")]
pub mod ws;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;

#[cfg(feature = "http")]
pub use http::build_router;
