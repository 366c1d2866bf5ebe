//! Batch and per-config run options
//!
//! None of these types implement `Default`: every field is set explicitly,
//! usually from [`ExfigSettings`], so a run never starts from state the caller
//! forgot to fill in.

use crate::config::ExfigSettings;
use std::path::PathBuf;

/// Dispatch policy of the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Upper bound on concurrently running configs (at least 1)
    pub max_parallel: usize,
    /// Stop dispatching after the first failure
    pub fail_fast: bool,
}

impl ExecutorOptions {
    pub fn new(max_parallel: usize, fail_fast: bool) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
            fail_fast,
        }
    }

    pub fn from_settings(settings: &ExfigSettings) -> Self {
        Self::new(settings.batch.max_parallel, settings.batch.fail_fast)
    }
}

/// Cache behaviour for every config of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Use the tracking cache at all
    pub enabled: bool,
    /// Export even when nothing changed (hashes are still refreshed)
    pub force_export: bool,
    /// Where the tracking cache lives
    pub cache_path: PathBuf,
    /// Enable node-level change detection
    pub experimental_granular: bool,
    /// Name suffix that marks the dark variant of an asset
    pub dark_mode_suffix: String,
}

impl CacheOptions {
    pub fn from_settings(settings: &ExfigSettings) -> Self {
        Self {
            enabled: settings.cache.enabled,
            force_export: settings.cache.force,
            cache_path: PathBuf::from(&settings.cache.path),
            experimental_granular: settings.cache.experimental_granular,
            dark_mode_suffix: settings.cache.dark_mode_suffix.clone(),
        }
    }

    /// Whether the node-hash tier runs
    pub fn granular_enabled(&self) -> bool {
        self.enabled && self.experimental_granular
    }
}

/// Options handed to each config run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRunOptions {
    pub cache: CacheOptions,
    /// Per-config limit on parallel asset downloads
    pub concurrent_downloads: usize,
}

impl ConfigRunOptions {
    pub fn new(cache: CacheOptions, concurrent_downloads: usize) -> Self {
        Self {
            cache,
            concurrent_downloads: concurrent_downloads.max(1),
        }
    }

    pub fn from_settings(settings: &ExfigSettings) -> Self {
        Self::new(
            CacheOptions::from_settings(settings),
            settings.cache.concurrent_downloads,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_options_clamp_parallelism() {
        assert_eq!(ExecutorOptions::new(0, false).max_parallel, 1);
        assert_eq!(ExecutorOptions::new(8, true).max_parallel, 8);
    }

    #[test]
    fn test_options_follow_settings() {
        let mut settings = ExfigSettings::default();
        settings.cache.enabled = true;
        settings.cache.experimental_granular = true;
        settings.cache.path = "build/cache.json".to_string();
        settings.cache.concurrent_downloads = 0;

        let options = ConfigRunOptions::from_settings(&settings);
        assert!(options.cache.granular_enabled());
        assert_eq!(options.cache.cache_path, PathBuf::from("build/cache.json"));
        assert_eq!(options.cache.dark_mode_suffix, "_dark");
        assert_eq!(options.concurrent_downloads, 1);
    }

    #[test]
    fn test_granular_requires_cache() {
        let mut settings = ExfigSettings::default();
        settings.cache.experimental_granular = true;

        assert!(!CacheOptions::from_settings(&settings).granular_enabled());
    }
}
