//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "collab-gate".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}

// =============================================================================
// Listener Defaults
// =============================================================================

pub fn default_auth_timeout() -> u64 {
    10
}

// =============================================================================
// Upstream API Defaults
// =============================================================================

pub fn default_api_timeout() -> u64 {
    5
}

pub fn default_user_agent() -> String {
    concat!("collab-gate/", env!("CARGO_PKG_VERSION")).to_string()
}
