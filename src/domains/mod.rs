//! Domains module containing business logic organized by bounded contexts.
//!
//! - **tools**: the tool registry and every tool exposed to clients
//! - **media**: scanning and best-match ranking of downloaded video files
//! - **backend**: the media center control client

pub mod backend;
pub mod media;
pub mod tools;
