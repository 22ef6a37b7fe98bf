//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, ApiConfig)
//! - [`listen`]: WebSocket listener configuration (ListenConfig, TlsConfig)
//! - [`defaults`]: serde default value functions
//! - [`validation`]: startup validation

mod defaults;
mod listen;
mod types;
pub mod validation;

pub use listen::{ListenConfig, TlsConfig};
pub use types::{API_BASE_URL_ENV, ApiConfig, Config, ConfigError, ServerConfig};
pub use validation::{ValidationError, validate};
