//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::defaults::{
    default_api_timeout, default_metrics_port, default_server_name, default_user_agent,
};
use super::listen::{ListenConfig, TlsConfig};

/// Environment variable that overrides `api.base_url`.
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {var} environment override: {source}")]
    Env {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Gate server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    #[serde(default)]
    pub server: ServerConfig,
    /// WebSocket listen configuration.
    pub listen: ListenConfig,
    /// Optional TLS configuration; when present the listener serves `wss://`.
    pub tls: Option<TlsConfig>,
    /// Account and membership service configuration.
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(API_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = Url::parse(raw.trim()).map_err(|source| ConfigError::Env {
                var: API_BASE_URL_ENV,
                source,
            })?;
        }
        Ok(())
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, used in logs and the health endpoint.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Prometheus metrics / health HTTP port (default: 9090, 0 disables).
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            metrics_port: default_metrics_port(),
        }
    }
}

/// Upstream API configuration shared by the identity and membership clients.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the account/project API (e.g., "http://api:8000").
    pub base_url: Url,
    /// Per-request timeout in seconds (default: 5).
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
    /// User agent sent on every upstream request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ApiConfig {
    /// Build an API config with defaults for everything but the base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout_secs: default_api_timeout(),
            user_agent: default_user_agent(),
        }
    }

    /// Request timeout as a [`Duration`].
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
