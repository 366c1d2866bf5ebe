//! Node-level change detection (the granular cache tier)
//!
//! After a file-version check says "changed", the granular tier narrows the
//! export down to the nodes whose content hash differs from the cached one.
//! Light and dark variants of an asset are paired by name (`<base>` and
//! `<base><dark suffix>`) and always exported together.

use super::hasher::ContentHasher;
use super::tracking::ImageTrackingCache;
use crate::adapters::remote::RateLimitedClient;
use crate::domain::ids::{FileId, NodeId};
use crate::domain::result::Result;
use crate::domain::stats::{ExportStats, GranularCacheStats, NodeHash};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// An exportable asset node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetNode {
    pub node_id: NodeId,
    pub name: String,
}

impl AssetNode {
    pub fn new(node_id: NodeId, name: impl Into<String>) -> Self {
        Self {
            node_id,
            name: name.into(),
        }
    }
}

/// Nodes selected for export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GranularFilterResult {
    /// Nodes to export, in input order
    pub included: Vec<AssetNode>,
    /// Hashes for every node whose document was fetched
    pub computed_hashes: HashMap<NodeId, NodeHash>,
    pub stats: GranularCacheStats,
}

impl GranularFilterResult {
    pub fn all_skipped(&self) -> bool {
        self.included.is_empty()
    }

    /// Adds counters and hashes to a config's stats
    pub fn record_into(&self, file_id: &FileId, stats: &mut ExportStats) {
        stats.record_node_hashes(
            file_id.clone(),
            self.computed_hashes
                .iter()
                .map(|(node, hash)| (node.clone(), hash.clone())),
        );
        stats.record_granular_stats(self.stats);
    }
}

/// Selection split into light and dark variants
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightDarkFilterResult {
    pub light: Vec<AssetNode>,
    pub dark: Vec<AssetNode>,
    pub computed_hashes: HashMap<NodeId, NodeHash>,
    pub stats: GranularCacheStats,
}

impl LightDarkFilterResult {
    pub fn all_skipped(&self) -> bool {
        self.light.is_empty() && self.dark.is_empty()
    }

    pub fn record_into(&self, file_id: &FileId, stats: &mut ExportStats) {
        stats.record_node_hashes(
            file_id.clone(),
            self.computed_hashes
                .iter()
                .map(|(node, hash)| (node.clone(), hash.clone())),
        );
        stats.record_granular_stats(self.stats);
    }
}

/// Decides which nodes of a changed file need exporting
pub struct GranularCacheManager {
    client: Arc<RateLimitedClient>,
    hasher: Arc<dyn ContentHasher>,
    dark_mode_suffix: String,
}

impl GranularCacheManager {
    pub fn new(
        client: Arc<RateLimitedClient>,
        hasher: Arc<dyn ContentHasher>,
        dark_mode_suffix: impl Into<String>,
    ) -> Self {
        Self {
            client,
            hasher,
            dark_mode_suffix: dark_mode_suffix.into(),
        }
    }

    /// Fetches node documents, hashes them and keeps the changed ones
    ///
    /// With `force` every node is included but hashes are still computed so
    /// the cache is refreshed. A fetch failure fails the whole call.
    pub async fn filter_changed(
        &self,
        file_id: &FileId,
        nodes: &[AssetNode],
        cache: &ImageTrackingCache,
        force: bool,
    ) -> Result<GranularFilterResult> {
        if nodes.is_empty() {
            return Ok(GranularFilterResult::default());
        }

        let ids: Vec<NodeId> = nodes.iter().map(|n| n.node_id.clone()).collect();
        let documents = self.client.nodes(file_id, &ids).await?;

        let result = self.select(file_id, nodes, &documents, cache, force);
        tracing::debug!(
            file_id = %file_id,
            nodes = nodes.len(),
            exported = result.stats.exported,
            skipped = result.stats.skipped,
            "Granular cache filter applied"
        );
        Ok(result)
    }

    /// Like [`filter_changed`](Self::filter_changed), split by dark suffix
    pub async fn filter_light_dark(
        &self,
        file_id: &FileId,
        nodes: &[AssetNode],
        cache: &ImageTrackingCache,
        force: bool,
    ) -> Result<LightDarkFilterResult> {
        let filtered = self.filter_changed(file_id, nodes, cache, force).await?;
        Ok(self.split_light_dark(filtered))
    }

    /// Pure selection over already fetched documents
    pub fn select(
        &self,
        file_id: &FileId,
        nodes: &[AssetNode],
        documents: &HashMap<NodeId, Value>,
        cache: &ImageTrackingCache,
        force: bool,
    ) -> GranularFilterResult {
        let mut computed_hashes = HashMap::new();
        let mut changed_names: HashSet<&str> = HashSet::new();

        for node in nodes {
            let changed = match documents.get(&node.node_id) {
                Some(document) => {
                    let hash = self.hasher.hash(document);
                    let cached = cache.cached_hash(file_id, &node.node_id);
                    let changed = cached != Some(hash.as_str());
                    computed_hashes.insert(node.node_id.clone(), hash);
                    changed
                }
                // Without a document there is nothing to compare against
                None => true,
            };
            if force || changed {
                changed_names.insert(node.name.as_str());
            }
        }

        let included: Vec<AssetNode> = nodes
            .iter()
            .filter(|node| {
                changed_names.contains(node.name.as_str())
                    || self
                        .partner_name(&node.name)
                        .is_some_and(|partner| changed_names.contains(partner.as_str()))
            })
            .cloned()
            .collect();

        let stats = GranularCacheStats::new(nodes.len() - included.len(), included.len());

        GranularFilterResult {
            included,
            computed_hashes,
            stats,
        }
    }

    /// Name of the other half of a light/dark pair
    fn partner_name(&self, name: &str) -> Option<String> {
        if self.dark_mode_suffix.is_empty() {
            return None;
        }
        match name.strip_suffix(self.dark_mode_suffix.as_str()) {
            Some(base) if !base.is_empty() => Some(base.to_string()),
            _ => Some(format!("{name}{}", self.dark_mode_suffix)),
        }
    }

    fn is_dark(&self, name: &str) -> bool {
        !self.dark_mode_suffix.is_empty()
            && name.len() > self.dark_mode_suffix.len()
            && name.ends_with(self.dark_mode_suffix.as_str())
    }

    fn split_light_dark(&self, filtered: GranularFilterResult) -> LightDarkFilterResult {
        let (dark, light): (Vec<_>, Vec<_>) = filtered
            .included
            .into_iter()
            .partition(|node| self.is_dark(&node.name));

        LightDarkFilterResult {
            light,
            dark,
            computed_hashes: filtered.computed_hashes,
            stats: filtered.stats,
        }
    }
}
