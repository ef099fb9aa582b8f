//! Media matching error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while scanning or matching media files.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The configured root directory could not be read.
    #[error("Directory unavailable: {path}: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No file in the tree matched any word of the query.
    #[error("No file matching '{query}' found in {root}")]
    NoMatchFound { query: String, root: PathBuf },

    /// The query contained no searchable words.
    #[error("Search query must not be empty")]
    EmptyQuery,
}

impl MediaError {
    /// Create a "directory unavailable" error.
    pub fn directory_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryUnavailable {
            path: path.into(),
            source,
        }
    }
}
