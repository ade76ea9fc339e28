//! # Configuration
//!
//! `rex.toml` settings, overridden by environment variables, overridden in
//! turn by CLI flags.
//!
//! ```toml
//! [repository]
//! base_url = "http://localhost:8091"
//! server_name = "cocoMDS1"
//! platform_name = "platform"
//! enterprise_option = false
//! timeout_secs = 30
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! rate_limit = 100
//! ```
//!
//! ## Environment Variables
//!
//! - `REX_REPOSITORY_URL`: view service base URL
//! - `REX_SERVER_NAME`: initially selected repository server
//! - `REX_PLATFORM_NAME`: platform hosting that server
//! - `REX_RATE_LIMIT`: API requests per second (0 disables)
//! - `REX_CORS_ORIGINS`: comma-separated allowed origins, or "*"

use rex_core::{RexError, ServerContext};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default API rate limit, requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Maximum config file size accepted.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Where the repository lives and which server is selected at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    pub base_url: String,
    pub server_name: String,
    pub platform_name: String,
    pub enterprise_option: bool,
    pub timeout_secs: u64,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8091".to_string(),
            server_name: String::new(),
            platform_name: String::new(),
            enterprise_option: false,
            timeout_secs: 30,
        }
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub rate_limit: u32,
    /// Comma-separated origins, "*" for any. Unset means localhost only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors_origins: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: None,
        }
    }
}

impl ServerSettings {
    /// `host:port` to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Complete Rex configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RexConfig {
    pub repository: RepositorySettings,
    pub server: ServerSettings,
}

impl RexConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, RexError> {
        toml::from_str(content)
            .map_err(|e| RexError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, RexError> {
        toml::to_string_pretty(self)
            .map_err(|e| RexError::SerializationError(format!("Render config: {}", e)))
    }

    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, RexError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, RexError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            RexError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(RexError::SerializationError(format!(
                "Config size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            RexError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("REX_REPOSITORY_URL") {
            self.repository.base_url = url;
        }
        if let Some(name) = lookup("REX_SERVER_NAME") {
            self.repository.server_name = name;
        }
        if let Some(name) = lookup("REX_PLATFORM_NAME") {
            self.repository.platform_name = name;
        }
        if let Some(raw) = lookup("REX_RATE_LIMIT") {
            match raw.parse() {
                Ok(limit) => self.server.rate_limit = limit,
                Err(_) => tracing::warn!("Ignoring invalid REX_RATE_LIMIT '{}'", raw),
            }
        }
        if let Some(origins) = lookup("REX_CORS_ORIGINS") {
            self.server.cors_origins = Some(origins);
        }
    }

    /// Server context selected at startup.
    pub fn selected_context(&self) -> ServerContext {
        ServerContext::new(
            self.repository.server_name.clone(),
            self.repository.platform_name.clone(),
            self.repository.enterprise_option,
        )
    }

    /// Request timeout for repository calls.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.repository.timeout_secs)
    }
}

// =============================================================================
// TESTS
// =============================================================================
