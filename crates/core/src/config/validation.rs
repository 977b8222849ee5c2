//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `upstream_base_url` is not an http(s) URL
    /// - any window or TTL is zero
    /// - `envelope_key` is set but does not decode to 32 bytes
    pub fn validate(&self) -> Result<(), ConfigError> {
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

        if !(self.upstream_base_url.starts_with("https://") || self.upstream_base_url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                field: "upstream_base_url".into(),
                reason: "must be an http(s) URL".into(),
            });
        }

        for (field, value) in [
            ("freshness_window_secs", self.freshness_window_secs),
            ("token_ttl_secs", self.token_ttl_secs),
            ("response_ttl_secs", self.response_ttl_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be greater than 0".into() });
            }
        }

        if let Some(key) = &self.envelope_key {
            let decoded = STANDARD.decode(key.trim()).map_err(|e| ConfigError::Invalid {
                field: "envelope_key".into(),
                reason: format!("not valid base64: {e}"),
            })?;
            if decoded.len() != 32 {
                return Err(ConfigError::Invalid {
                    field: "envelope_key".into(),
                    reason: format!("must decode to 32 bytes, got {}", decoded.len()),
                });
            }
        }

        if self.token_ttl_secs > self.response_ttl_secs {
            tracing::warn!(
                token_ttl_secs = self.token_ttl_secs,
                response_ttl_secs = self.response_ttl_secs,
                "token outlives cached responses; upstream may reject stale tokens"
            );
        }

        Ok(())
    }
}
