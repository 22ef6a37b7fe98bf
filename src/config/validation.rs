//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("api.base_url must use http or https, got '{0}'")]
    UnsupportedApiScheme(String),
    #[error("api.base_url cannot carry a query or fragment: {0}")]
    ApiUrlHasQuery(String),
    #[error("api.timeout_secs must be greater than zero")]
    ZeroApiTimeout,
    #[error("listen.auth_timeout_secs must be greater than zero")]
    ZeroAuthTimeout,
    #[error("tls.cert_path does not exist: {0}")]
    TlsCertNotFound(String),
    #[error("tls.key_path does not exist: {0}")]
    TlsKeyNotFound(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    let base = &config.api.base_url;
    if !matches!(base.scheme(), "http" | "https") {
        errors.push(ValidationError::UnsupportedApiScheme(base.scheme().to_string()));
    }
    if base.query().is_some() || base.fragment().is_some() {
        errors.push(ValidationError::ApiUrlHasQuery(base.to_string()));
    }
    if config.api.timeout_secs == 0 {
        errors.push(ValidationError::ZeroApiTimeout);
    }
    if config.listen.auth_timeout_secs == 0 {
        errors.push(ValidationError::ZeroAuthTimeout);
    }

    if let Some(ref tls) = config.tls {
        if !Path::new(&tls.cert_path).exists() {
            errors.push(ValidationError::TlsCertNotFound(tls.cert_path.clone()));
        }
        if !Path::new(&tls.key_path).exists() {
            errors.push(ValidationError::TlsKeyNotFound(tls.key_path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
