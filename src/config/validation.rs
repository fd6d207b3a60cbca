//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and addresses.
//! All errors are collected rather than stopping at the first one.

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully-merged configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.listener.workers == Some(0) {
        errors.push(ValidationError::new("listener.workers", "must be at least 1"));
    }

    if config.storage.snapshot_threshold == 0 {
        errors.push(ValidationError::new("storage.snapshot_threshold", "must be at least 1"));
    }

    if config.storage.blacklist_file.as_os_str().is_empty() {
        errors.push(ValidationError::new("storage.blacklist_file", "must not be empty"));
    }

    if config.origin.default_port == 0 {
        errors.push(ValidationError::new("origin.default_port", "must not be 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
