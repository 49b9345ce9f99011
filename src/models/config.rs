//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Anti-bot challenge settings
    #[serde(default)]
    pub challenge: ChallengeConfig,

    /// Where blobs are kept
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.default_pages == 0 {
            return Err(AppError::validation("crawler.default_pages must be >= 1"));
        }
        if !self.challenge.endpoint_path.starts_with('/') {
            return Err(AppError::validation(
                "challenge.endpoint_path must start with '/'",
            ));
        }
        if self.challenge.ttl_hours == 0 {
            return Err(AppError::validation("challenge.ttl_hours must be > 0"));
        }
        for (key, name) in [
            ("storage.notifications_blob", &self.storage.notifications_blob),
            ("storage.config_blob", &self.storage.config_blob),
            ("challenge.cache_blob", &self.challenge.cache_blob),
        ] {
            if name.trim().is_empty() {
                return Err(AppError::validation(format!("{key} is empty")));
            }
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Listing pages walked per source when the caller does not say
    #[serde(default = "defaults::pages")]
    pub default_pages: usize,

    /// Delay between listing page requests in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::timeout(),
            default_pages: defaults::pages(),
            request_delay_ms: 0,
        }
    }
}

/// Anti-bot challenge handshake settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// Path on the guarded host that accepts the challenge answer
    #[serde(default = "defaults::endpoint_path")]
    pub endpoint_path: String,

    /// Lifetime of an acquired client id
    #[serde(default = "defaults::ttl_hours")]
    pub ttl_hours: u64,

    /// Blob holding the client id cache
    #[serde(default = "defaults::cache_blob")]
    pub cache_blob: String,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            endpoint_path: defaults::endpoint_path(),
            ttl_hours: defaults::ttl_hours(),
            cache_blob: defaults::cache_blob(),
        }
    }
}

/// Blob locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for cache blobs (notifications, client ids)
    #[serde(default = "defaults::cache_dir")]
    pub cache_dir: PathBuf,

    /// Directory for user data blobs (subscription config)
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "defaults::notifications_blob")]
    pub notifications_blob: String,

    #[serde(default = "defaults::config_blob")]
    pub config_blob: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_dir: defaults::cache_dir(),
            data_dir: defaults::data_dir(),
            notifications_blob: defaults::notifications_blob(),
            config_blob: defaults::config_blob(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level: debug, info, warn, error
    #[serde(default = "defaults::level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn timeout() -> u64 {
        30
    }
    pub fn pages() -> usize {
        1
    }
    pub fn endpoint_path() -> String {
        "/dynamic_challenge".into()
    }
    pub fn ttl_hours() -> u64 {
        24
    }
    pub fn cache_blob() -> String {
        "client_id.json".into()
    }
    pub fn cache_dir() -> PathBuf {
        PathBuf::from("storage/cache")
    }
    pub fn data_dir() -> PathBuf {
        PathBuf::from("storage/data")
    }
    pub fn notifications_blob() -> String {
        "notification.json".into()
    }
    pub fn config_blob() -> String {
        "notification_config.json".into()
    }
    pub fn level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.challenge.ttl_hours, 24);
        assert_eq!(config.storage.notifications_blob, "notification.json");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            default_pages = 3

            [challenge]
            endpoint_path = "/verify"
            "#,
        )
        .unwrap();
        assert_eq!(config.crawler.default_pages, 3);
        assert_eq!(config.crawler.timeout_secs, 30);
        assert_eq!(config.challenge.endpoint_path, "/verify");
        assert_eq!(config.challenge.cache_blob, "client_id.json");
    }

    #[test]
    fn test_validate_rejects_zero_pages() {
        let mut config = Config::default();
        config.crawler.default_pages = 0;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_relative_endpoint() {
        let mut config = Config::default();
        config.challenge.endpoint_path = "verify".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("does/not/exist.toml");
        assert_eq!(config.logging.level, "info");
    }
}
