//! Discover command implementation
//!
//! Shows what a batch would run without contacting the remote API.

use crate::config::{load_settings_or_default, ExfigSettings};
use crate::core::discovery::{ConfigDiscovery, FileIdExtractor, PatternConfigReader};
use crate::domain::config_file::{ConfigFile, OutputPathConflict};
use crate::domain::ids::FileId;
use crate::domain::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the discover command
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Directory to scan (defaults to the current directory)
    #[arg(conflicts_with = "configs")]
    pub dir: Option<PathBuf>,

    /// Explicit config files instead of a directory scan
    #[arg(long = "config", value_name = "PATH")]
    pub configs: Vec<PathBuf>,
}

/// What discovery found
#[derive(Debug)]
pub struct DiscoveryReport {
    pub valid: Vec<ConfigFile>,
    pub invalid: Vec<ConfigFile>,
    pub conflicts: Vec<OutputPathConflict>,
    pub file_ids: Vec<FileId>,
}

impl DiscoverArgs {
    /// Execute the discover command
    pub async fn execute(&self, settings_path: &str) -> anyhow::Result<i32> {
        let settings = match load_settings_or_default(settings_path) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to load settings");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let report = match self.collect(&settings) {
            Ok(report) => report,
            Err(e) => {
                println!("❌ Discovery failed");
                println!("   Error: {e}");
                return Ok(3);
            }
        };

        println!("🔍 Found {} config(s)", report.valid.len());
        for config in &report.valid {
            println!("   {} ({})", config.name, config.path.display());
        }

        if !report.invalid.is_empty() {
            println!();
            println!("⚠️  Skipped {} file(s) that are not configs:", report.invalid.len());
            for config in &report.invalid {
                println!("   {}", config.path.display());
            }
        }

        if !report.conflicts.is_empty() {
            println!();
            println!("⚠️  Output path conflicts:");
            for conflict in &report.conflicts {
                println!(
                    "   {} <- {}",
                    conflict.path.display(),
                    conflict.config_names().join(", ")
                );
            }
        }

        println!();
        println!("📄 Referenced file ids ({}):", report.file_ids.len());
        for file_id in &report.file_ids {
            println!("   {file_id}");
        }

        Ok(0)
    }

    /// Runs discovery, filtering, conflict detection and file-id extraction
    ///
    /// # Errors
    ///
    /// Discovery errors for a missing directory or config file.
    pub fn collect(&self, settings: &ExfigSettings) -> Result<DiscoveryReport> {
        let discovery = ConfigDiscovery::from_config(&settings.discovery);
        let reader = Arc::new(PatternConfigReader::new());

        let candidates = if self.configs.is_empty() {
            let dir = self.dir.clone().unwrap_or_else(|| PathBuf::from("."));
            discovery.discover_in_directory(dir)?
        } else {
            discovery.discover_from_paths(&self.configs)?
        };

        let filtered = discovery.filter_valid_configs(candidates);
        let conflicts = discovery.detect_output_path_conflicts(&filtered.valid, &*reader);
        let file_ids = FileIdExtractor::new(reader).extract_unique(&filtered.valid);

        tracing::debug!(
            valid = filtered.valid.len(),
            invalid = filtered.invalid.len(),
            conflicts = conflicts.len(),
            file_ids = file_ids.len(),
            "Discovery finished"
        );

        Ok(DiscoveryReport {
            valid: filtered.valid,
            invalid: filtered.invalid,
            conflicts,
            file_ids,
        })
    }
}
