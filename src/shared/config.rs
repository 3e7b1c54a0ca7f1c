//! Application configuration module
//!
//! Provides configuration for the sync engine: where the API lives, where
//! the local cache file goes, and the tuning knobs of the retry machinery.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default server URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Environment variable overriding the server URL
const SERVER_URL_ENV: &str = "SAFESPACE_API_URL";

/// Network send attempts are abandoned (and classified as connectivity
/// failures) after this long.
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// A queued message is abandoned after this many failed attempts.
const DEFAULT_RETRY_CEILING: u32 = 3;

/// Cached presence snapshots go stale after this long.
const DEFAULT_PRESENCE_TTL: Duration = Duration::from_secs(15);

/// Sync engine configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the messaging API
    pub server_url: String,
    /// Path of the local cache database. `None` uses the platform data
    /// directory; opening may still fail, in which case the engine runs
    /// online-only.
    pub database_path: Option<PathBuf>,
    /// Per-request timeout for network sends
    pub send_timeout: Duration,
    /// Failed attempts allowed per queued message before it is abandoned
    pub retry_ceiling: u32,
    /// Time-to-live for cached presence data
    pub presence_ttl: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let server_url =
            std::env::var(SERVER_URL_ENV).unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        Self {
            server_url,
            database_path: None,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            retry_ceiling: DEFAULT_RETRY_CEILING,
            presence_ttl: DEFAULT_PRESENCE_TTL,
        }
    }
}

impl SyncConfig {
    /// Create a new SyncConfigBuilder
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }
}

/// Builder for SyncConfig
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    server_url: Option<String>,
    database_path: Option<PathBuf>,
    send_timeout: Option<Duration>,
    retry_ceiling: Option<u32>,
    presence_ttl: Option<Duration>,
}

impl SyncConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the local database path
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Set the network send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Set the retry ceiling
    pub fn retry_ceiling(mut self, ceiling: u32) -> Self {
        self.retry_ceiling = Some(ceiling);
        self
    }

    /// Set the presence cache TTL
    pub fn presence_ttl(mut self, ttl: Duration) -> Self {
        self.presence_ttl = Some(ttl);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<SyncConfig, ConfigError> {
        let defaults = SyncConfig::default();
        let server_url = self.server_url.unwrap_or(defaults.server_url);
        if server_url.is_empty() {
            return Err(ConfigError::InvalidUrl(server_url));
        }
        if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(server_url));
        }
        let send_timeout = self.send_timeout.unwrap_or(defaults.send_timeout);
        if send_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("send_timeout"));
        }
        let retry_ceiling = self.retry_ceiling.unwrap_or(defaults.retry_ceiling);
        if retry_ceiling == 0 {
            return Err(ConfigError::InvalidValue("retry_ceiling"));
        }
        Ok(SyncConfig {
            server_url,
            database_path: self.database_path,
            send_timeout,
            retry_ceiling,
            presence_ttl: self.presence_ttl.unwrap_or(defaults.presence_ttl),
        })
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}
