//! Configuration schema types
//!
//! Engine settings for a batch run. This is not the per-project config
//! language; those files are discovered and read by `core::discovery`.

use crate::config::SecretString;
use crate::domain::{ExfigError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main settings structure that maps to the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExfigSettings {
    /// Batch scheduling
    #[serde(default)]
    pub batch: BatchSettings,

    /// Outbound request pacing
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry behaviour for transient failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Remote API access
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Version and node-hash caching
    #[serde(default)]
    pub cache: CacheConfig,

    /// Config discovery
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ExfigSettings {
    /// Validates the settings
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid value
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.batch.validate()?;
        self.rate_limit.validate()?;
        self.retry.validate()?;
        self.remote.validate()?;
        self.cache.validate()?;
        self.discovery.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Batch scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Maximum configs exported at the same time
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Stop dispatching new configs after the first failure
    #[serde(default)]
    pub fail_fast: bool,

    /// Resume from a previous interrupted run
    #[serde(default)]
    pub resume: bool,

    /// Checkpoint file location
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            fail_fast: false,
            resume: false,
            checkpoint_path: default_checkpoint_path(),
        }
    }
}

impl BatchSettings {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.max_parallel == 0 || self.max_parallel > 64 {
            return Err(format!(
                "batch.max_parallel must be between 1 and 64, got {}",
                self.max_parallel
            ));
        }
        if self.checkpoint_path.trim().is_empty() {
            return Err("batch.checkpoint_path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Token bucket settings shared by all workers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained request rate
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Requests that may be issued back to back after an idle period
    #[serde(default = "default_burst_capacity")]
    pub burst_capacity: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            burst_capacity: default_burst_capacity(),
        }
    }
}

impl RateLimitConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.requests_per_minute == 0 {
            return Err("rate_limit.requests_per_minute must be greater than 0".to_string());
        }
        if self.burst_capacity == 0 {
            return Err("rate_limit.burst_capacity must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.max_retries == 0 {
            return Err("retry.max_retries must be at least 1".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "retry.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(format!(
                "retry.initial_delay_ms ({}) cannot exceed retry.max_delay_ms ({})",
                self.initial_delay_ms, self.max_delay_ms
            ));
        }
        Ok(())
    }
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Personal access token (usually supplied through FIGMA_PERSONAL_TOKEN)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default, skip_serializing)]
    pub access_token: Option<SecretString>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            access_token: None,
        }
    }
}

impl RemoteConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.timeout_seconds == 0 {
            return Err("remote.timeout_seconds must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// The access token, or an authentication error when none is configured
    ///
    /// # Errors
    ///
    /// Returns `ExfigError::Authentication` if the token is missing or blank.
    pub fn require_access_token(&self) -> Result<&SecretString> {
        use secrecy::ExposeSecret;

        match &self.access_token {
            Some(token) if !token.expose_secret().is_blank() => Ok(token),
            _ => Err(ExfigError::Authentication(
                "FIGMA_PERSONAL_TOKEN is not set".to_string(),
            )),
        }
    }
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the version cache
    #[serde(default)]
    pub enabled: bool,

    /// Ignore cached versions and hashes; export everything
    #[serde(default)]
    pub force: bool,

    /// Cache file location
    #[serde(default = "default_cache_path")]
    pub path: String,

    /// Enable the per-node content-hash tier
    #[serde(default)]
    pub experimental_granular: bool,

    /// Suffix that marks the dark variant of an asset in single-file mode
    #[serde(default = "default_dark_mode_suffix")]
    pub dark_mode_suffix: String,

    /// Concurrent asset downloads within one config
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            force: false,
            path: default_cache_path(),
            experimental_granular: false,
            dark_mode_suffix: default_dark_mode_suffix(),
            concurrent_downloads: default_concurrent_downloads(),
        }
    }
}

impl CacheConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("cache.path cannot be empty".to_string());
        }
        if self.dark_mode_suffix.is_empty() {
            return Err("cache.dark_mode_suffix cannot be empty".to_string());
        }
        if self.concurrent_downloads == 0 {
            return Err("cache.concurrent_downloads must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Extension of config files, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
        }
    }
}

impl DiscoveryConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(format!(
                "discovery.extension must be a bare extension like 'pkl', got '{}'",
                self.extension
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

fn default_max_parallel() -> usize {
    3
}

fn default_checkpoint_path() -> String {
    ".exfig-checkpoint.json".to_string()
}

fn default_requests_per_minute() -> u32 {
    10
}

fn default_burst_capacity() -> u32 {
    3
}

fn default_max_retries() -> usize {
    4
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_cache_path() -> String {
    ".exfig-cache.json".to_string()
}

fn default_dark_mode_suffix() -> String {
    "_dark".to_string()
}

fn default_concurrent_downloads() -> usize {
    20
}

fn default_extension() -> String {
    "pkl".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[test]
    fn test_defaults_are_valid() {
        let settings = ExfigSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.batch.max_parallel, 3);
        assert_eq!(settings.cache.path, ".exfig-cache.json");
        assert!(!settings.cache.enabled);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings: ExfigSettings = toml::from_str("").unwrap();
        assert_eq!(settings.rate_limit.requests_per_minute, 10);
        assert_eq!(settings.retry.max_retries, 4);
        assert_eq!(settings.discovery.extension, "pkl");
    }

    #[test]
    fn test_invalid_max_parallel() {
        let mut settings = ExfigSettings::default();
        settings.batch.max_parallel = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.contains("max_parallel"));
    }

    #[test]
    fn test_invalid_rate_limit() {
        let mut settings = ExfigSettings::default();
        settings.rate_limit.burst_capacity = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_retry_delays() {
        let mut settings = ExfigSettings::default();
        settings.retry.initial_delay_ms = 60_000;
        assert!(settings.validate().unwrap_err().contains("initial_delay_ms"));
    }

    #[test]
    fn test_invalid_extension() {
        let mut settings = ExfigSettings::default();
        settings.discovery.extension = ".pkl".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_require_access_token() {
        let mut remote = RemoteConfig::default();
        assert!(matches!(
            remote.require_access_token(),
            Err(ExfigError::Authentication(_))
        ));

        remote.access_token = Some(secret_string("   ".to_string()));
        assert!(remote.require_access_token().is_err());

        remote.access_token = Some(secret_string("figd_123".to_string()));
        assert!(remote.require_access_token().is_ok());
    }
}
