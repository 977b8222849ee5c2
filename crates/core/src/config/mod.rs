//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (VODGATE_*)
//! 2. TOML config file (if VODGATE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (VODGATE_*)
/// 2. TOML config file (if VODGATE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite key-value store.
    ///
    /// Set via VODGATE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the catalog API.
    ///
    /// Set via VODGATE_UPSTREAM_BASE_URL environment variable.
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,

    /// Site origin sent as Referer/Origin on upstream calls.
    ///
    /// Set via VODGATE_SITE_ORIGIN environment variable.
    #[serde(default = "default_site_origin")]
    pub site_origin: String,

    /// User-Agent string for upstream requests.
    ///
    /// Set via VODGATE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upstream request timeout in milliseconds.
    ///
    /// Set via VODGATE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Base64 AES-256 key for envelope payloads.
    ///
    /// Set via VODGATE_ENVELOPE_KEY environment variable.
    /// Required at server startup.
    #[serde(default)]
    pub envelope_key: Option<String>,

    /// Maximum envelope age in seconds.
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,

    /// Lifetime of the cached upstream token.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Lifetime of cached upstream responses.
    #[serde(default = "default_response_ttl_secs")]
    pub response_ttl_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./vodgate-cache.sqlite")
}

fn default_upstream_base_url() -> String {
    "https://api.olelive.com/v1/pub".into()
}

fn default_site_origin() -> String {
    "https://www.olevod.com/".into()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
        .into()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_freshness_window_secs() -> u64 {
    crate::envelope::FRESHNESS_WINDOW_SECS
}

fn default_token_ttl_secs() -> u64 {
    crate::token::TOKEN_TTL_SECS
}

fn default_response_ttl_secs() -> u64 {
    crate::cache::RESPONSE_TTL_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            upstream_base_url: default_upstream_base_url(),
            site_origin: default_site_origin(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            envelope_key: None,
            freshness_window_secs: default_freshness_window_secs(),
            token_ttl_secs: default_token_ttl_secs(),
            response_ttl_secs: default_response_ttl_secs(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("VODGATE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("VODGATE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The envelope key, required before any enveloped request is served.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_envelope_key(&self) -> Result<&str, ConfigError> {
        self.envelope_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "envelope_key".into(),
            hint: "Set VODGATE_ENVELOPE_KEY to a base64 32-byte key".into(),
        })
    }
}
