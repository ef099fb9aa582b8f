//! Tools domain module.
//!
//! Tools are named, schema-described operations exposed identically by every
//! transport.
//!
//! ## Architecture
//!
//! - `definitions/` - Tool implementations, grouped by area
//! - `schema.rs` - Tool descriptors and parameter validation
//! - `handlers.rs` - Handler trait, call context and result envelope
//! - `registry.rs` - Central tool registry and dispatch
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Declare its parameters as a `Deserialize + JsonSchema` struct
//! 2. Add a unit struct with `NAME`, `DESCRIPTION` and `descriptor()` to the
//!    matching file in `definitions/`
//! 3. Implement `ToolHandler` for it
//! 4. Register it in `build_tool_registry`
//!
//! Transports pick it up from the registry; nothing else changes.

pub mod definitions;
mod error;
mod handlers;
mod registry;
pub mod schema;

pub use error::{ToolError, ToolErrorKind};
pub use handlers::*;
pub use registry::{ToolRegistry, build_tool_registry};
pub use schema::{NoParams, ParamSpec, ParamType, ToolDescriptor};
