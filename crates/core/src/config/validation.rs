//! Configuration validation rules.
//!
//! This module provides validation logic for `ScrapyardConfig` values
//! after they have been resolved from environment, files, or defaults.

use crate::config::ScrapyardConfig;
use thiserror::Error;

/// Upper bound on the worker pool size.
const MAX_CONNECTIONS: usize = 256;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl ScrapyardConfig {
    /// Validate configuration values after resolving.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `retry` is 0
    /// - `connections` is 0 or exceeds 256
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry == 0 {
            return Err(ConfigError::Invalid { field: "retry".into(), reason: "must be at least 1".into() });
        }

        if self.connections == 0 {
            return Err(ConfigError::Invalid { field: "connections".into(), reason: "must be at least 1".into() });
        }
        if self.connections > MAX_CONNECTIONS {
            return Err(ConfigError::Invalid {
                field: "connections".into(),
                reason: format!("must not exceed {MAX_CONNECTIONS}"),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !self.freshness.is_zero() && self.cache.is_none() {
            tracing::warn!(
                freshness = ?self.freshness,
                "freshness is set but caching is disabled; it has no effect"
            );
        }

        Ok(())
    }
}
