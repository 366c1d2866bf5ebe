//! Export statistics and their merge rules
//!
//! Stats from concurrently running configs arrive in any order, so merging
//! must be associative: counts sum, hash maps union with the right-hand side
//! winning on collisions, and granular stats sum with `None` as identity.

use crate::domain::ids::{FileId, NodeId};
use crate::domain::metadata::FileMetadata;
use std::collections::HashMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Content hash of a single node (hex encoded)
pub type NodeHash = String;

/// Node hashes grouped by the file they belong to
pub type FileNodeHashes = HashMap<FileId, HashMap<NodeId, NodeHash>>;

/// Skip/export counts from the node-hash cache tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GranularCacheStats {
    /// Nodes whose content hash was unchanged
    pub skipped: usize,
    /// Nodes that were (re-)exported
    pub exported: usize,
}

impl GranularCacheStats {
    /// Create a new stats value
    pub fn new(skipped: usize, exported: usize) -> Self {
        Self { skipped, exported }
    }

    /// Total nodes considered
    pub fn total(&self) -> usize {
        self.skipped + self.exported
    }

    /// Merge two optional stats; `None` is the identity
    ///
    /// ```
    /// use exfig::domain::GranularCacheStats;
    ///
    /// let merged = GranularCacheStats::merge(
    ///     Some(GranularCacheStats::new(10, 2)),
    ///     Some(GranularCacheStats::new(5, 3)),
    /// );
    /// assert_eq!(merged, Some(GranularCacheStats::new(15, 5)));
    /// assert_eq!(GranularCacheStats::merge(None, None), None);
    /// ```
    pub fn merge(lhs: Option<Self>, rhs: Option<Self>) -> Option<Self> {
        match (lhs, rhs) {
            (None, None) => None,
            (Some(stats), None) | (None, Some(stats)) => Some(stats),
            (Some(a), Some(b)) => Some(Self {
                skipped: a.skipped + b.skipped,
                exported: a.exported + b.exported,
            }),
        }
    }
}

/// What one config export produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportStats {
    /// Colors exported
    pub colors: usize,
    /// Icons exported
    pub icons: usize,
    /// Images exported
    pub images: usize,
    /// Text styles exported
    pub typography: usize,
    /// Node hashes computed during this run, per file
    pub computed_hashes: FileNodeHashes,
    /// File versions that were exported during this run
    pub file_versions: HashMap<FileId, FileMetadata>,
    /// Node-hash cache counters, if the granular tier ran
    pub granular_cache_stats: Option<GranularCacheStats>,
}

impl ExportStats {
    /// Create stats with only counts set
    pub fn new(colors: usize, icons: usize, images: usize, typography: usize) -> Self {
        Self {
            colors,
            icons,
            images,
            typography,
            ..Self::default()
        }
    }

    /// Sum of all exported items
    pub fn total_exported(&self) -> usize {
        self.colors + self.icons + self.images + self.typography
    }

    /// Record hashes computed for nodes of a file
    pub fn record_node_hashes(
        &mut self,
        file_id: FileId,
        hashes: impl IntoIterator<Item = (NodeId, NodeHash)>,
    ) {
        self.computed_hashes.entry(file_id).or_default().extend(hashes);
    }

    /// Record the version of a file that was exported
    pub fn record_file_version(&mut self, file_id: FileId, metadata: FileMetadata) {
        self.file_versions.insert(file_id, metadata);
    }

    /// Add node-hash tier counters
    pub fn record_granular_stats(&mut self, stats: GranularCacheStats) {
        self.granular_cache_stats = GranularCacheStats::merge(self.granular_cache_stats, Some(stats));
    }
}

impl AddAssign for ExportStats {
    fn add_assign(&mut self, rhs: Self) {
        self.colors += rhs.colors;
        self.icons += rhs.icons;
        self.images += rhs.images;
        self.typography += rhs.typography;
        for (file_id, hashes) in rhs.computed_hashes {
            self.computed_hashes.entry(file_id).or_default().extend(hashes);
        }
        self.file_versions.extend(rhs.file_versions);
        self.granular_cache_stats =
            GranularCacheStats::merge(self.granular_cache_stats, rhs.granular_cache_stats);
    }
}

impl Add for ExportStats {
    type Output = ExportStats;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl Sum for ExportStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ExportStats::default(), |acc, stats| acc + stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: &str) -> FileId {
        FileId::new(id).unwrap()
    }

    fn node(id: &str) -> NodeId {
        NodeId::new(id).unwrap()
    }

    #[test]
    fn test_counts_sum() {
        let a = ExportStats {
            colors: 10,
            icons: 5,
            ..Default::default()
        };
        let b = ExportStats {
            colors: 3,
            icons: 5,
            ..Default::default()
        };

        let merged = a + b;
        assert_eq!(merged.colors, 13);
        assert_eq!(merged.icons, 10);
        assert_eq!(merged, ExportStats::new(13, 10, 0, 0));
    }

    #[test]
    fn test_hashes_for_different_files_union() {
        let mut a = ExportStats::default();
        a.record_node_hashes(file("A"), [(node("1:1"), "h1".to_string())]);
        let mut b = ExportStats::default();
        b.record_node_hashes(file("B"), [(node("2:2"), "h2".to_string())]);

        let merged = a + b;
        assert_eq!(merged.computed_hashes.len(), 2);
        assert_eq!(merged.computed_hashes[&file("A")][&node("1:1")], "h1");
        assert_eq!(merged.computed_hashes[&file("B")][&node("2:2")], "h2");
    }

    #[test]
    fn test_hash_collision_right_wins() {
        let mut a = ExportStats::default();
        a.record_node_hashes(
            file("A"),
            [(node("1:1"), "old".to_string()), (node("1:2"), "keep".to_string())],
        );
        let mut b = ExportStats::default();
        b.record_node_hashes(file("A"), [(node("1:1"), "new".to_string())]);

        let merged = a + b;
        let hashes = &merged.computed_hashes[&file("A")];
        assert_eq!(hashes[&node("1:1")], "new");
        assert_eq!(hashes[&node("1:2")], "keep");
    }

    #[test]
    fn test_granular_merge_identity() {
        let x = GranularCacheStats::new(4, 1);
        assert_eq!(GranularCacheStats::merge(None, None), None);
        assert_eq!(GranularCacheStats::merge(Some(x), None), Some(x));
        assert_eq!(GranularCacheStats::merge(None, Some(x)), Some(x));
    }

    #[test]
    fn test_granular_merge_sums() {
        let merged = GranularCacheStats::merge(
            Some(GranularCacheStats::new(10, 2)),
            Some(GranularCacheStats::new(5, 3)),
        )
        .unwrap();
        assert_eq!(merged, GranularCacheStats::new(15, 5));
        assert_eq!(merged.total(), 20);
    }

    #[test]
    fn test_sum_is_order_independent_for_counts() {
        let stats = vec![
            ExportStats::new(1, 2, 3, 4),
            ExportStats::new(5, 6, 7, 8),
            ExportStats::new(9, 10, 11, 12),
        ];
        let forward: ExportStats = stats.clone().into_iter().sum();
        let backward: ExportStats = stats.into_iter().rev().sum();
        assert_eq!(forward, backward);
        assert_eq!(forward, ExportStats::new(15, 18, 21, 24));
        assert_eq!(forward.total_exported(), 78);
    }
}
