//! Configuration loading from TOML.

use std::path::Path;
use std::time::Duration;

use bridge::BridgeOptions;
use protocol::{AppInfo, PROTOCOL_VERSION};
use serde::Deserialize;

use crate::host::HostType;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Widget identity announced to the host.
    pub app: AppConfig,

    /// Which host the widget runs in and how to talk to it.
    #[serde(default)]
    pub host: HostConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// Declared host style; selects the adaptor strategy once at startup.
    #[serde(rename = "type", default)]
    pub host_type: HostType,

    /// How long a message-passing request waits for its response.
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host_type: HostType::default(),
            request_timeout_ms: default_timeout_ms(),
            protocol_version: default_protocol_version(),
        }
    }
}

fn default_version() -> String {
    "0.0.0".to_string()
}

fn default_timeout_ms() -> u64 {
    bridge::DEFAULT_TIMEOUT.as_millis() as u64
}

fn default_protocol_version() -> String {
    PROTOCOL_VERSION.to_string()
}

impl Config {
    /// Configuration for `name`/`version` with default host settings.
    pub fn new(name: impl Into<String>, version: impl Into<String>, host_type: HostType) -> Self {
        Self {
            app: AppConfig {
                name: name.into(),
                version: version.into(),
            },
            host: HostConfig {
                host_type,
                ..HostConfig::default()
            },
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.app.name.trim().is_empty() {
            return Err(ConfigError::MissingAppName);
        }
        Ok(config)
    }

    pub fn app_info(&self) -> AppInfo {
        AppInfo {
            name: self.app.name.clone(),
            version: self.app.version.clone(),
        }
    }

    pub fn bridge_options(&self) -> BridgeOptions {
        BridgeOptions {
            request_timeout: Duration::from_millis(self.host.request_timeout_ms),
            protocol_version: self.host.protocol_version.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("app.name must not be empty")]
    MissingAppName,
}
