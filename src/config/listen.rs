//! Network listener configuration.

use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use super::defaults::default_auth_timeout;

/// WebSocket listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:3100").
    pub address: SocketAddr,
    /// Allowed origins for CORS (e.g., `["https://app.example.com"]`).
    /// Empty list allows all origins.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    /// Seconds a client has to send its auth frame after the upgrade (default: 10).
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_secs: u64,
}

impl ListenConfig {
    #[inline]
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    /// Check an `Origin` header value against the allow list.
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allow_origins.is_empty() {
            return true;
        }
        match origin {
            Some(origin) => self.allow_origins.iter().any(|a| a == origin || a == "*"),
            None => false,
        }
    }
}

/// TLS configuration for the WebSocket listener.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM format).
    pub cert_path: String,
    /// Path to private key file (PEM format, PKCS#8).
    pub key_path: String,
}
