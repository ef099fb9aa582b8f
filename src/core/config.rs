//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables (and a `.env` file, when present) on top of defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::transport::TransportConfig;
use super::transport::config::env_parse;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Media center connection.
    pub backend: BackendConfig,

    /// Local media directories.
    pub media: MediaConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "kodi-mcp-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Load only the logging settings (`MCP_LOG_LEVEL`).
    ///
    /// Must run before [`Config::from_env`] when its warnings should reach the
    /// subscriber.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut logging = Self::default();
        if let Some(level) = env_string("MCP_LOG_LEVEL") {
            logging.level = level;
        }
        logging
    }
}

/// Connection settings for the Kodi JSON-RPC API.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,

    /// Per-request timeout.
    pub timeout_secs: u64,

    /// Total attempts per call, including the first one.
    pub retry_attempts: u32,

    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay_ms: u64,
}

impl BackendConfig {
    /// URL of the JSON-RPC endpoint.
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/jsonrpc", self.host, self.port)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            username: None,
            password: None,
            timeout_secs: 10,
            retry_attempts: 3,
            retry_delay_ms: 500,
        }
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .finish()
    }
}

/// Local media directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Root scanned by the downloads tools.
    pub downloads_path: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            downloads_path: PathBuf::from("/media/downloads"),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Server settings use the `MCP_` prefix, media center settings the
    /// `KODI_` prefix. For example: `MCP_HTTP_PORT`, `KODI_HOST`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(name) = env_string("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.logging = LoggingConfig::from_env();

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        let defaults = BackendConfig::default();
        config.backend = BackendConfig {
            host: env_string("KODI_HOST").unwrap_or(defaults.host),
            port: env_parse("KODI_PORT", defaults.port),
            username: env_string("KODI_USERNAME"),
            password: env_string("KODI_PASSWORD"),
            timeout_secs: env_parse("KODI_TIMEOUT_SECS", defaults.timeout_secs),
            retry_attempts: env_parse("KODI_RETRY_ATTEMPTS", defaults.retry_attempts),
            retry_delay_ms: defaults.retry_delay_ms,
        };
        info!("Media center endpoint: {}", config.backend.endpoint());

        match env_string("KODI_DOWNLOADS_PATH") {
            Some(path) => config.media.downloads_path = PathBuf::from(path),
            None => warn!(
                "KODI_DOWNLOADS_PATH not set - using {}",
                config.media.downloads_path.display()
            ),
        }

        config
    }
}
