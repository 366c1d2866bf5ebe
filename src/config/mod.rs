//! Configuration management for ExFig.
//!
//! Engine settings come from a TOML file (default `exfig.toml`) with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for every setting
//! - `EXFIG_<SECTION>_<KEY>` environment overrides
//! - Validation on load
//!
//! # Example Settings
//!
//! ```toml
//! [batch]
//! max_parallel = 4
//! fail_fast = false
//!
//! [rate_limit]
//! requests_per_minute = 10
//! burst_capacity = 3
//!
//! [retry]
//! max_retries = 4
//! initial_delay_ms = 1000
//!
//! [cache]
//! enabled = true
//! path = ".exfig-cache.json"
//! experimental_granular = true
//! dark_mode_suffix = "_dark"
//! ```
//!
//! The remote API token is read from `FIGMA_PERSONAL_TOKEN`.
//!
//! ```rust,no_run
//! use exfig::config::load_settings;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = load_settings("exfig.toml")?;
//! println!("Parallel configs: {}", settings.batch.max_parallel);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_settings, load_settings_or_default, ACCESS_TOKEN_ENV};
pub use schema::{
    BatchSettings, CacheConfig, DiscoveryConfig, ExfigSettings, LoggingConfig, RateLimitConfig,
    RemoteConfig, RetryConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
