//! What a config's export pipeline gets to work with

use super::options::ConfigRunOptions;
use crate::adapters::remote::RateLimitedClient;
use crate::core::cache::{ContentHasher, GranularCacheManager, SharedGranularCache};
use crate::core::prefetch::PreFetchedFileVersions;
use crate::domain::config_file::ConfigFile;
use crate::domain::events::EventSink;
use crate::domain::ids::FileId;
use crate::domain::metadata::FileMetadata;
use crate::domain::result::Result;
use std::sync::Arc;

/// Shared resources of one batch, created once before dispatch
#[derive(Clone)]
pub struct BatchResources {
    pub client: Arc<RateLimitedClient>,
    pub versions: Arc<PreFetchedFileVersions>,
    /// Present when the tracking cache is enabled
    pub shared_cache: Option<SharedGranularCache>,
    pub hasher: Arc<dyn ContentHasher>,
    pub events: Arc<dyn EventSink>,
}

/// Tier-1 decision for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileVersionCheck {
    /// Version matches the last export; nothing to do for this file
    Skip(FileMetadata),
    /// File changed, was never exported, or caching is off or forced
    Export(FileMetadata),
}

impl FileVersionCheck {
    pub fn metadata(&self) -> &FileMetadata {
        match self {
            Self::Skip(metadata) | Self::Export(metadata) => metadata,
        }
    }

    pub fn should_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }
}

/// Per-config view of the batch resources
#[derive(Clone)]
pub struct ExportContext {
    config: ConfigFile,
    options: ConfigRunOptions,
    resources: BatchResources,
}

impl ExportContext {
    pub fn new(config: ConfigFile, options: ConfigRunOptions, resources: BatchResources) -> Self {
        Self {
            config,
            options,
            resources,
        }
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn options(&self) -> &ConfigRunOptions {
        &self.options
    }

    /// Rate-limited client shared by the batch
    pub fn client(&self) -> &Arc<RateLimitedClient> {
        &self.resources.client
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.resources.events
    }

    pub fn shared_cache(&self) -> Option<&SharedGranularCache> {
        self.resources.shared_cache.as_ref()
    }

    /// File metadata from the pre-fetch, or fetched now when it is missing
    pub async fn file_metadata(&self, file_id: &FileId) -> Result<FileMetadata> {
        if let Some(metadata) = self.resources.versions.metadata(file_id) {
            return Ok(metadata.clone());
        }

        tracing::debug!(
            config = %self.config.name,
            file_id = %file_id,
            "File version not pre-fetched, fetching directly"
        );
        self.resources.client.file_metadata(file_id).await
    }

    /// Decides whether `file_id` needs exporting at all
    ///
    /// Skips only when caching is enabled, not forced, and the cached version
    /// equals the current one.
    pub async fn check_file_version(&self, file_id: &FileId) -> Result<FileVersionCheck> {
        let metadata = self.file_metadata(file_id).await?;
        let cache = &self.options.cache;

        let unchanged = cache.enabled
            && !cache.force_export
            && self
                .resources
                .shared_cache
                .as_ref()
                .is_some_and(|shared| !shared.snapshot().needs_export(file_id, &metadata.version));

        if unchanged {
            tracing::debug!(
                config = %self.config.name,
                file_id = %file_id,
                version = %metadata.version,
                "File unchanged since last export"
            );
            Ok(FileVersionCheck::Skip(metadata))
        } else {
            Ok(FileVersionCheck::Export(metadata))
        }
    }

    /// Node-level filter, when granular caching is on for this run
    pub fn granular_manager(&self) -> Option<GranularCacheManager> {
        if !self.options.cache.granular_enabled() || self.resources.shared_cache.is_none() {
            return None;
        }
        Some(GranularCacheManager::new(
            self.resources.client.clone(),
            self.resources.hasher.clone(),
            self.options.cache.dark_mode_suffix.clone(),
        ))
    }
}
