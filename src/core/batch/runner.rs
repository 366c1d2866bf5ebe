//! Runs one config's export pipeline against the shared batch resources

use super::context::{BatchResources, ExportContext};
use super::options::ConfigRunOptions;
use super::result::ConfigResult;
use crate::core::cache::shared;
use crate::domain::config_file::ConfigFile;
use crate::domain::result::Result;
use crate::domain::stats::ExportStats;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// The per-config export pipeline (colors, icons, images, typography)
///
/// Implementations write generated files; the engine only sees the stats or
/// the error.
#[async_trait]
pub trait ConfigExporter: Send + Sync {
    async fn export(&self, ctx: &ExportContext) -> Result<ExportStats>;
}

/// Turns one [`ConfigFile`] into one [`ConfigResult`]
#[derive(Clone)]
pub struct BatchConfigRunner {
    resources: BatchResources,
    options: ConfigRunOptions,
    exporter: Arc<dyn ConfigExporter>,
}

impl BatchConfigRunner {
    pub fn new(
        resources: BatchResources,
        options: ConfigRunOptions,
        exporter: Arc<dyn ConfigExporter>,
    ) -> Self {
        Self {
            resources,
            options,
            exporter,
        }
    }

    pub fn options(&self) -> &ConfigRunOptions {
        &self.options
    }

    /// Runs the exporter for `config`
    ///
    /// When the batch has a tracking cache it is bound to the task for the
    /// whole run, so nested work can reach it through
    /// [`shared::current`](crate::core::cache::shared::current).
    pub async fn run(&self, config: ConfigFile) -> ConfigResult {
        let ctx = ExportContext::new(config.clone(), self.options.clone(), self.resources.clone());
        let started = Instant::now();

        tracing::info!(config = %config.name, path = %config.path.display(), "Exporting config");

        let outcome = match self.resources.shared_cache.clone() {
            Some(cache) => shared::scope(cache, self.exporter.export(&ctx)).await,
            None => self.exporter.export(&ctx).await,
        };

        let elapsed = started.elapsed();
        match outcome {
            Ok(stats) => {
                crate::log_config_complete!(config.name, stats.total_exported(), elapsed);
                ConfigResult::success(config, stats)
            }
            Err(error) => {
                tracing::error!(
                    config = %config.name,
                    error = %error,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Config export failed"
                );
                ConfigResult::failure(config, error)
            }
        }
    }
}
