//! Batch coordinator - main orchestrator for a batch export
//!
//! Wires discovery, checkpointing, pre-fetch, the tracking cache and the
//! executor into one run:
//!
//! 1. Discover and filter configs, warn about output path conflicts
//! 2. Verify credentials (fatal before anything runs)
//! 3. Load or start the checkpoint, dropping configs already completed
//! 4. Pre-fetch the versions of every referenced remote file
//! 5. Warm-load the tracking cache
//! 6. Dispatch configs through the executor
//! 7. Merge successful configs' versions and hashes into the cache and save it
//! 8. Finalise the checkpoint and log the summary

use super::context::BatchResources;
use super::executor::BatchExecutor;
use super::options::{ConfigRunOptions, ExecutorOptions};
use super::result::BatchResult;
use super::runner::{BatchConfigRunner, ConfigExporter};
use crate::adapters::remote::{RateLimitedClient, RemoteClient};
use crate::config::ExfigSettings;
use crate::core::cache::{ContentHasher, ImageTrackingCache, SharedGranularCache, VisualContentHasher};
use crate::core::discovery::{ConfigDiscovery, ConfigReader, FileIdExtractor, PatternConfigReader};
use crate::core::prefetch::PreFetchedFileVersions;
use crate::core::rate_limit::SharedRateLimiter;
use crate::core::retry::RetryPolicy;
use crate::core::state::{BatchCheckpoint, CheckpointManager};
use crate::domain::config_file::ConfigFile;
use crate::domain::errors::{DiscoveryError, ExfigError};
use crate::domain::events::{BatchEvent, EventSink};
use crate::domain::ids::FileId;
use crate::domain::result::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Where a batch gets its configs from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchInputs {
    /// Every config file directly inside a directory
    Directory(PathBuf),
    /// An explicit list of config files
    Paths(Vec<PathBuf>),
}

impl BatchInputs {
    fn describe(&self) -> String {
        match self {
            BatchInputs::Directory(dir) => dir.display().to_string(),
            BatchInputs::Paths(paths) => format!("{} explicit path(s)", paths.len()),
        }
    }
}

/// Batch coordinator
pub struct BatchCoordinator {
    settings: ExfigSettings,
    remote: Arc<dyn RemoteClient>,
    exporter: Arc<dyn ConfigExporter>,
    reader: Arc<dyn ConfigReader>,
    hasher: Arc<dyn ContentHasher>,
    events: Arc<dyn EventSink>,
}

impl BatchCoordinator {
    /// Create a new coordinator
    ///
    /// # Errors
    ///
    /// `ExfigError::Configuration` when the settings do not validate.
    pub fn new(
        settings: ExfigSettings,
        remote: Arc<dyn RemoteClient>,
        exporter: Arc<dyn ConfigExporter>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        settings
            .validate()
            .map_err(|e| ExfigError::Configuration(format!("Settings validation failed: {e}")))?;

        Ok(Self {
            settings,
            remote,
            exporter,
            reader: Arc::new(PatternConfigReader::new()),
            hasher: Arc::new(VisualContentHasher),
            events,
        })
    }

    /// Replace the config reader used for discovery and file-id extraction
    pub fn with_reader(mut self, reader: Arc<dyn ConfigReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Replace the node content hasher
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn settings(&self) -> &ExfigSettings {
        &self.settings
    }

    /// Runs the whole batch
    ///
    /// Per-config failures are reported in the returned [`BatchResult`].
    ///
    /// # Errors
    ///
    /// Only setup problems: discovery errors, no usable configs, or a missing
    /// credential.
    pub async fn run(&self, inputs: BatchInputs) -> Result<BatchResult> {
        tracing::info!(inputs = %inputs.describe(), "Starting batch export");

        let configs = self.discover(&inputs)?;

        self.settings.remote.require_access_token()?;
        if !self.remote.is_authenticated() {
            return Err(ExfigError::Authentication(
                "remote client has no credentials; set FIGMA_PERSONAL_TOKEN".to_string(),
            ));
        }

        let checkpoint = self.begin_checkpoint(&configs).await;
        let to_run: Vec<ConfigFile> = match &checkpoint {
            Some((_, state)) => configs
                .iter()
                .filter(|c| !state.is_completed(c))
                .cloned()
                .collect(),
            None => configs.clone(),
        };
        let checkpoint = checkpoint.map(|(manager, _)| manager);

        let client = Arc::new(RateLimitedClient::new(
            self.remote.clone(),
            Arc::new(SharedRateLimiter::from_config(&self.settings.rate_limit)),
            RetryPolicy::from_config(&self.settings.retry),
            self.settings.remote.timeout(),
            self.events.clone(),
        ));

        let file_ids = FileIdExtractor::new(self.reader.clone()).extract_unique(&to_run);
        let versions = PreFetchedFileVersions::fetch(
            &client,
            &file_ids,
            self.settings.batch.max_parallel,
            &*self.events,
        )
        .await;

        let run_options = ConfigRunOptions::from_settings(&self.settings);
        let shared_cache = self.load_cache(&run_options);

        let resources = BatchResources {
            client,
            versions: Arc::new(versions),
            shared_cache: shared_cache.clone(),
            hasher: self.hasher.clone(),
            events: self.events.clone(),
        };
        let runner = BatchConfigRunner::new(resources, run_options, self.exporter.clone());
        let executor = BatchExecutor::new(
            ExecutorOptions::from_settings(&self.settings),
            self.events.clone(),
        );

        let handler_checkpoint = checkpoint.clone();
        let result = executor
            .execute(to_run, move |config| {
                let runner = runner.clone();
                let checkpoint = handler_checkpoint.clone();
                async move {
                    let result = runner.run(config).await;
                    if let (true, Some(manager)) = (result.is_success(), checkpoint.as_ref()) {
                        if let Err(e) = manager.mark_completed(result.config()).await {
                            tracing::warn!(config = %result.config().name, error = %e, "Failed to record checkpoint progress");
                        }
                    }
                    result
                }
            })
            .await;

        if let Some(shared) = &shared_cache {
            self.save_cache(shared, &result);
        }

        if let Some(manager) = &checkpoint {
            let unfinished = result.failure_count() + result.not_dispatched.len();
            if let Err(e) = manager.finish(unfinished).await {
                tracing::warn!(error = %e, "Failed to finalise checkpoint");
            }
        }

        result.log_summary();
        Ok(result)
    }

    fn discover(&self, inputs: &BatchInputs) -> Result<Vec<ConfigFile>> {
        let discovery = ConfigDiscovery::from_config(&self.settings.discovery);

        let candidates = match inputs {
            BatchInputs::Directory(dir) => discovery.discover_in_directory(dir)?,
            BatchInputs::Paths(paths) => discovery.discover_from_paths(paths)?,
        };

        let filtered = discovery.filter_valid_configs(candidates);
        if !filtered.invalid.is_empty() {
            tracing::warn!(count = filtered.invalid.len(), "Skipping files that are not valid configs");
            self.events.emit(BatchEvent::InvalidConfigsSkipped {
                count: filtered.invalid.len(),
            });
        }

        if filtered.valid.is_empty() {
            return Err(DiscoveryError::NoConfigsFound(inputs.describe()).into());
        }

        for conflict in discovery.detect_output_path_conflicts(&filtered.valid, &*self.reader)
        {
            tracing::warn!(
                path = %conflict.path.display(),
                configs = ?conflict.config_names(),
                "Several configs write to the same output path"
            );
            self.events.emit(BatchEvent::OutputPathConflict(conflict));
        }

        tracing::info!(configs = filtered.valid.len(), "Configs discovered");
        Ok(filtered.valid)
    }

    /// Checkpointing problems never stop a batch; it just runs untracked
    async fn begin_checkpoint(
        &self,
        configs: &[ConfigFile],
    ) -> Option<(Arc<CheckpointManager>, BatchCheckpoint)> {
        let manager = Arc::new(CheckpointManager::new(&self.settings.batch.checkpoint_path));
        match manager
            .begin(configs, self.settings.batch.resume, &*self.events)
            .await
        {
            Ok(state) => Some((manager, state)),
            Err(e) => {
                tracing::warn!(error = %e, "Checkpointing disabled for this run");
                None
            }
        }
    }

    fn load_cache(&self, options: &ConfigRunOptions) -> Option<SharedGranularCache> {
        let cache_options = &options.cache;

        if cache_options.experimental_granular && !cache_options.enabled {
            self.events.emit(BatchEvent::GranularCacheMisconfigured {
                reason: "experimental granular cache requires the cache to be enabled".to_string(),
            });
        }
        if !cache_options.enabled {
            return None;
        }

        let path = &cache_options.cache_path;
        let cache = match ImageTrackingCache::load(path) {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding tracking cache");
                self.events.emit(BatchEvent::CacheDiscarded {
                    path: path.clone(),
                    reason: e.to_string(),
                });
                ImageTrackingCache::new()
            }
        };

        tracing::debug!(
            path = %path.display(),
            files = cache.file_count(),
            node_hashes = cache.node_hash_count(),
            "Tracking cache loaded"
        );
        Some(SharedGranularCache::new(cache, path.clone()))
    }

    /// Only successful configs' updates are merged
    ///
    /// Files also referenced by a failed config keep their old version and
    /// hashes, so that config is retried in full next time.
    fn save_cache(&self, shared: &SharedGranularCache, result: &BatchResult) {
        if result.success_count() == 0 {
            return;
        }

        let failed: Vec<ConfigFile> = result.failures().map(|(config, _)| config.clone()).collect();
        let held_back: HashSet<FileId> = FileIdExtractor::new(self.reader.clone())
            .extract_unique(&failed)
            .into_iter()
            .collect();
        if !held_back.is_empty() {
            tracing::debug!(files = held_back.len(), "Holding back cache updates shared with failed configs");
        }

        let mut cache = shared.working_copy();
        for (_, stats) in result.successes() {
            cache.apply_export(stats, &held_back);
        }

        if let Err(e) = cache.save(shared.path()) {
            tracing::error!(path = %shared.path().display(), error = %e, "Failed to save tracking cache");
        }
    }
}
