//! Persisted asset tracking cache
//!
//! One JSON document records, per remote file, the version seen at the last
//! successful export and the per-node content hashes used by the granular
//! tier:
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "files": {
//!     "abc123": {
//!       "version": "4810",
//!       "fileName": "Design System",
//!       "lastExport": "2025-01-02T03:04:05Z",
//!       "nodeHashes": { "12:34": "9f86d0..." }
//!     }
//!   }
//! }
//! ```

use crate::domain::errors::ExfigError;
use crate::domain::ids::{FileId, NodeId};
use crate::domain::metadata::FileMetadata;
use crate::domain::result::Result;
use crate::domain::stats::{ExportStats, NodeHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Current on-disk schema version
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Tracking entry for one remote file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedFileInfo {
    /// Version at the last successful export; empty when only hashes are known
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    pub last_export: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_hashes: BTreeMap<NodeId, NodeHash>,
}

impl CachedFileInfo {
    fn empty() -> Self {
        Self {
            version: String::new(),
            file_name: None,
            last_export: Utc::now(),
            node_hashes: BTreeMap::new(),
        }
    }
}

/// Versions and node hashes recorded by earlier exports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTrackingCache {
    pub schema_version: u32,

    #[serde(default)]
    pub files: BTreeMap<FileId, CachedFileInfo>,
}

impl Default for ImageTrackingCache {
    fn default() -> Self {
        Self {
            schema_version: CACHE_SCHEMA_VERSION,
            files: BTreeMap::new(),
        }
    }
}

impl ImageTrackingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the cache from `path`
    ///
    /// A missing file yields an empty cache. An unreadable, corrupt or
    /// foreign-schema file is an `ExfigError::Cache`; callers decide whether
    /// to discard it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            ExfigError::Cache(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let cache: Self = serde_json::from_str(&contents).map_err(|e| {
            ExfigError::Cache(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        if cache.schema_version != CACHE_SCHEMA_VERSION {
            return Err(ExfigError::Cache(format!(
                "Unsupported cache schema version {} in {} (expected {})",
                cache.schema_version,
                path.display(),
                CACHE_SCHEMA_VERSION
            )));
        }

        Ok(cache)
    }

    /// Writes the cache to `path` atomically (temp file, then rename)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        let tmp = temp_path(path);
        fs::write(&tmp, json).map_err(|e| {
            ExfigError::Cache(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            ExfigError::Cache(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), files = self.files.len(), "Tracking cache saved");
        Ok(())
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn node_hash_count(&self) -> usize {
        self.files.values().map(|f| f.node_hashes.len()).sum()
    }

    pub fn cached_version(&self, file_id: &FileId) -> Option<&str> {
        self.files
            .get(file_id)
            .map(|info| info.version.as_str())
            .filter(|version| !version.is_empty())
    }

    /// Whether `version` differs from what was last exported
    pub fn needs_export(&self, file_id: &FileId, version: &str) -> bool {
        self.cached_version(file_id) != Some(version)
    }

    pub fn node_hashes(&self, file_id: &FileId) -> Option<&BTreeMap<NodeId, NodeHash>> {
        self.files.get(file_id).map(|info| &info.node_hashes)
    }

    pub fn cached_hash(&self, file_id: &FileId, node_id: &NodeId) -> Option<&str> {
        self.files
            .get(file_id)
            .and_then(|info| info.node_hashes.get(node_id))
            .map(String::as_str)
    }

    /// Records a successful export of `file_id` at `metadata.version`
    ///
    /// Node hashes survive version changes; they are compared per node.
    pub fn update_version(&mut self, file_id: &FileId, metadata: &FileMetadata) {
        let entry = self
            .files
            .entry(file_id.clone())
            .or_insert_with(CachedFileInfo::empty);
        entry.version = metadata.version.clone();
        entry.file_name = Some(metadata.name.clone());
        entry.last_export = Utc::now();
    }

    /// Merges node hashes for `file_id`, overwriting existing entries
    pub fn merge_node_hashes(
        &mut self,
        file_id: &FileId,
        hashes: impl IntoIterator<Item = (NodeId, NodeHash)>,
    ) {
        let entry = self
            .files
            .entry(file_id.clone())
            .or_insert_with(CachedFileInfo::empty);
        entry.node_hashes.extend(hashes);
    }

    /// Folds the outcome of a batch into the cache: versions first, then hashes
    ///
    /// Versions are tracked per file, not per config. Files in `held_back`
    /// (shared with a config that failed) are left untouched so that config
    /// is not skipped next run with its output never written.
    pub fn apply_export(&mut self, stats: &ExportStats, held_back: &HashSet<FileId>) {
        for (file_id, metadata) in &stats.file_versions {
            if held_back.contains(file_id) {
                continue;
            }
            self.update_version(file_id, metadata);
        }
        for (file_id, hashes) in &stats.computed_hashes {
            if held_back.contains(file_id) {
                continue;
            }
            self.merge_node_hashes(
                file_id,
                hashes.iter().map(|(node, hash)| (node.clone(), hash.clone())),
            );
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_id(s: &str) -> FileId {
        FileId::new(s).unwrap()
    }

    fn node_id(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let cache = ImageTrackingCache::load(dir.path().join("cache.json")).unwrap();
        assert_eq!(cache, ImageTrackingCache::new());
    }

    #[test]
    fn test_save_and_load_preserves_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/cache.json");

        let mut cache = ImageTrackingCache::new();
        cache.update_version(&file_id("f1"), &FileMetadata::new("Icons", "v7"));
        cache.merge_node_hashes(&file_id("f1"), [(node_id("1:1"), "aaa".to_string())]);
        cache.save(&path).unwrap();

        assert!(!dir.path().join("nested/cache.json.tmp").exists());

        let loaded = ImageTrackingCache::load(&path).unwrap();
        assert_eq!(loaded.cached_version(&file_id("f1")), Some("v7"));
        assert_eq!(loaded.cached_hash(&file_id("f1"), &node_id("1:1")), Some("aaa"));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"schemaVersion\": 1"));
        assert!(raw.contains("\"nodeHashes\""));
    }

    #[test]
    fn test_corrupt_file_is_cache_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            ImageTrackingCache::load(&path),
            Err(ExfigError::Cache(_))
        ));
    }

    #[test]
    fn test_unknown_schema_is_cache_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{"schemaVersion": 99, "files": {}}"#).unwrap();

        let err = ImageTrackingCache::load(&path).unwrap_err();
        assert!(err.to_string().contains("schema version 99"));
    }

    #[test]
    fn test_needs_export() {
        let mut cache = ImageTrackingCache::new();
        let id = file_id("f1");
        assert!(cache.needs_export(&id, "v1"));

        cache.update_version(&id, &FileMetadata::new("f", "v1"));
        assert!(!cache.needs_export(&id, "v1"));
        assert!(cache.needs_export(&id, "v2"));
    }

    #[test]
    fn test_hashes_without_version_still_need_export() {
        let mut cache = ImageTrackingCache::new();
        let id = file_id("f1");
        cache.merge_node_hashes(&id, [(node_id("1:1"), "h".to_string())]);

        assert_eq!(cache.cached_version(&id), None);
        assert!(cache.needs_export(&id, ""));
        assert_eq!(cache.node_hash_count(), 1);
    }

    #[test]
    fn test_apply_export() {
        let mut stats = ExportStats::new(1, 2, 0, 0);
        stats.record_file_version(file_id("f1"), FileMetadata::new("Icons", "v3"));
        stats.record_node_hashes(file_id("f1"), [(node_id("2:2"), "h2".to_string())]);

        let mut cache = ImageTrackingCache::new();
        cache.merge_node_hashes(&file_id("f1"), [(node_id("1:1"), "h1".to_string())]);
        cache.apply_export(&stats, &HashSet::new());

        assert_eq!(cache.cached_version(&file_id("f1")), Some("v3"));
        assert_eq!(cache.node_hash_count(), 2);
    }

    #[test]
    fn test_apply_export_leaves_held_back_files() {
        let mut stats = ExportStats::default();
        stats.record_file_version(file_id("f1"), FileMetadata::new("Icons", "v2"));
        stats.record_file_version(file_id("f2"), FileMetadata::new("Colors", "v9"));
        stats.record_node_hashes(file_id("f1"), [(node_id("1:1"), "new".to_string())]);

        let mut cache = ImageTrackingCache::new();
        cache.update_version(&file_id("f1"), &FileMetadata::new("Icons", "v1"));
        cache.apply_export(&stats, &HashSet::from([file_id("f1")]));

        assert_eq!(cache.cached_version(&file_id("f1")), Some("v1"));
        assert_eq!(cache.cached_version(&file_id("f2")), Some("v9"));
        assert_eq!(cache.node_hash_count(), 0);
    }
}
