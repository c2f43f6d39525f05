//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `namespace` is empty or contains whitespace
    /// - `version` is set but empty
    /// - `origin` is not http(s)
    /// - `skeleton` is empty or an entry does not resolve
    /// - `static_prefix` does not start and end with `/`
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.is_empty() || self.namespace.chars().any(char::is_whitespace) {
            return Err(invalid("namespace", "must be non-empty and contain no whitespace"));
        }
        if self.version.as_deref().is_some_and(str::is_empty) {
            return Err(invalid("version", "must not be empty when set"));
        }

        if !matches!(self.origin.scheme(), "http" | "https") {
            return Err(invalid("origin", format!("unsupported scheme: {}", self.origin.scheme())));
        }

        if self.skeleton.is_empty() {
            return Err(invalid("skeleton", "must list at least one asset"));
        }
        self.skeleton_urls()?;

        if !self.static_prefix.starts_with('/') || !self.static_prefix.ends_with('/') {
            return Err(invalid("static_prefix", "must start and end with '/'"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !self.skeleton.iter().any(|entry| entry == "/") {
            tracing::warn!(
                skeleton_count = self.skeleton.len(),
                "skeleton does not include '/'; offline navigations will have no shell to fall back to"
            );
        }

        Ok(())
    }
}
