//! Media center backend domain.
//!
//! - `client.rs` - the `MediaCenter` contract and the Kodi JSON-RPC client
//! - `types.rs` - navigation and library value types
//! - `error.rs` - backend error types

pub mod client;
mod error;
pub mod types;

pub use client::{KodiClient, MediaCenter};
pub use error::BackendError;
pub use types::{LibraryType, NavigationDirection};
