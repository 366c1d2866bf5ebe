//! Status command implementation
//!
//! Prints the checkpoint of an interrupted batch and what the tracking cache
//! remembers.

use crate::config::load_settings_or_default;
use crate::core::cache::ImageTrackingCache;
use crate::core::state::CheckpointManager;
use chrono::Utc;
use clap::Args;
use std::path::Path;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// List every cached file, not just the totals
    #[arg(short, long)]
    pub verbose: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, settings_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking batch status");

        let settings = match load_settings_or_default(settings_path) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to load settings");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("📊 Batch Status");
        println!();
        self.print_checkpoint(Path::new(&settings.batch.checkpoint_path));
        println!();
        self.print_cache(Path::new(&settings.cache.path), settings.cache.enabled);

        Ok(0)
    }

    fn print_checkpoint(&self, path: &Path) {
        match CheckpointManager::read(path) {
            Ok(None) => println!("No checkpoint at {} (last batch finished cleanly)", path.display()),
            Ok(Some(checkpoint)) => {
                let age = checkpoint.age_at(Utc::now());
                let state = if checkpoint.is_expired() {
                    "expired"
                } else {
                    "resumable"
                };
                println!("Checkpoint {} ({state})", path.display());
                println!("   Run:       {}", checkpoint.run_id);
                println!(
                    "   Started:   {} ({}h ago)",
                    checkpoint.created_at.format("%Y-%m-%d %H:%M:%S"),
                    age.num_hours()
                );
                println!(
                    "   Completed: {}/{}",
                    checkpoint.completed_count(),
                    checkpoint.config_paths.len()
                );
                if self.verbose {
                    for config_path in &checkpoint.config_paths {
                        let mark = if checkpoint.completed.contains(config_path) {
                            "✅"
                        } else {
                            "⏸️ "
                        };
                        println!("   {mark} {}", config_path.display());
                    }
                }
            }
            Err(e) => {
                println!("⚠️  Checkpoint {} is unreadable", path.display());
                println!("   Error: {e}");
            }
        }
    }

    fn print_cache(&self, path: &Path, enabled: bool) {
        let state = if enabled { "enabled" } else { "disabled" };

        match ImageTrackingCache::load(path) {
            Ok(cache) if cache.file_count() == 0 => {
                println!("Tracking cache {} ({state}): empty", path.display());
            }
            Ok(cache) => {
                println!(
                    "Tracking cache {} ({state}): {} file(s), {} node hash(es)",
                    path.display(),
                    cache.file_count(),
                    cache.node_hash_count()
                );
                if self.verbose {
                    println!();
                    println!(
                        "{:<30} {:<20} {:<10} {:<20}",
                        "File ID", "Version", "Nodes", "Last Export"
                    );
                    println!("{}", "-".repeat(80));
                    for (file_id, info) in &cache.files {
                        println!(
                            "{:<30} {:<20} {:<10} {:<20}",
                            file_id.as_str(),
                            if info.version.is_empty() { "-" } else { info.version.as_str() },
                            info.node_hashes.len(),
                            info.last_export.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
            }
            Err(e) => {
                println!("⚠️  Tracking cache {} is unusable and will be discarded", path.display());
                println!("   Error: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_with_missing_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings_path = dir.path().join("exfig.toml");
        let checkpoint = dir.path().join("checkpoint.json");
        let cache = dir.path().join("cache.json");
        std::fs::write(
            &settings_path,
            format!(
                "[batch]\ncheckpoint_path = {:?}\n\n[cache]\npath = {:?}\n",
                checkpoint.display().to_string(),
                cache.display().to_string()
            ),
        )
        .unwrap();

        let args = StatusArgs { verbose: true };
        let code = args.execute(settings_path.to_str().unwrap()).await.unwrap();
        assert_eq!(code, 0);
    }
}
