//! Per-config and per-batch results

use crate::domain::config_file::ConfigFile;
use crate::domain::errors::ExfigError;
use crate::domain::stats::ExportStats;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Outcome of one config run
#[derive(Debug)]
pub enum ConfigResult {
    Success {
        config: ConfigFile,
        stats: ExportStats,
    },
    Failure {
        config: ConfigFile,
        error: ExfigError,
    },
}

impl ConfigResult {
    pub fn success(config: ConfigFile, stats: ExportStats) -> Self {
        Self::Success { config, stats }
    }

    pub fn failure(config: ConfigFile, error: ExfigError) -> Self {
        Self::Failure { config, error }
    }

    pub fn config(&self) -> &ConfigFile {
        match self {
            Self::Success { config, .. } | Self::Failure { config, .. } => config,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn stats(&self) -> Option<&ExportStats> {
        match self {
            Self::Success { stats, .. } => Some(stats),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ExfigError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}

/// Everything a batch run produced
#[derive(Debug)]
pub struct BatchResult {
    /// One result per dispatched config, in submission order
    pub results: Vec<ConfigResult>,

    /// Configs never dispatched because fail-fast stopped the run
    pub not_dispatched: Vec<ConfigFile>,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    /// `end_time - start_time`
    pub duration: Duration,
}

impl BatchResult {
    pub fn new(
        results: Vec<ConfigResult>,
        not_dispatched: Vec<ConfigFile>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let duration = (end_time - start_time).to_std().unwrap_or(Duration::ZERO);
        Self {
            results,
            not_dispatched,
            start_time,
            end_time,
            duration,
        }
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    /// Successful configs with their stats
    pub fn successes(&self) -> impl Iterator<Item = (&ConfigFile, &ExportStats)> {
        self.results.iter().filter_map(|r| match r {
            ConfigResult::Success { config, stats } => Some((config, stats)),
            ConfigResult::Failure { .. } => None,
        })
    }

    /// Failed configs with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&ConfigFile, &ExfigError)> {
        self.results.iter().filter_map(|r| match r {
            ConfigResult::Failure { config, error } => Some((config, error)),
            ConfigResult::Success { .. } => None,
        })
    }

    /// Sum of the stats of successful configs; failures contribute nothing
    pub fn total_stats(&self) -> ExportStats {
        self.successes().map(|(_, stats)| stats.clone()).sum()
    }

    pub fn result_for(&self, config: &ConfigFile) -> Option<&ConfigResult> {
        self.results.iter().find(|r| r.config() == config)
    }

    /// True when every dispatched config succeeded
    pub fn is_successful(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn log_summary(&self) {
        let totals = self.total_stats();

        tracing::info!(
            configs = self.results.len(),
            succeeded = self.success_count(),
            failed = self.failure_count(),
            not_dispatched = self.not_dispatched.len(),
            colors = totals.colors,
            icons = totals.icons,
            images = totals.images,
            typography = totals.typography,
            duration_ms = self.duration.as_millis() as u64,
            "Batch completed"
        );

        if let Some(granular) = totals.granular_cache_stats {
            tracing::info!(
                skipped = granular.skipped,
                exported = granular.exported,
                "Granular cache summary"
            );
        }

        for (config, error) in self.failures() {
            tracing::warn!(
                config = %config.name,
                path = %config.path.display(),
                error = %error,
                "Config export failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{FileId, NodeId};

    fn config(name: &str) -> ConfigFile {
        ConfigFile::new(format!("{name}.pkl"))
    }

    #[test]
    fn test_counts_and_lookup() {
        let now = Utc::now();
        let result = BatchResult::new(
            vec![
                ConfigResult::success(config("a"), ExportStats::new(1, 0, 0, 0)),
                ConfigResult::failure(config("b"), ExfigError::Export("boom".to_string())),
            ],
            vec![config("c")],
            now,
            now + chrono::Duration::milliseconds(1500),
        );

        assert_eq!(result.success_count(), 1);
        assert_eq!(result.failure_count(), 1);
        assert!(!result.is_successful());
        assert_eq!(result.duration, Duration::from_millis(1500));
        assert!(result.result_for(&config("b")).unwrap().error().is_some());
        assert!(result.result_for(&config("c")).is_none());
    }

    #[test]
    fn test_total_stats_excludes_failures() {
        let mut with_hashes = ExportStats::new(10, 5, 0, 0);
        with_hashes.record_node_hashes(
            FileId::new("f").unwrap(),
            [(NodeId::new("1:1").unwrap(), "h".to_string())],
        );

        let now = Utc::now();
        let result = BatchResult::new(
            vec![
                ConfigResult::success(config("a"), with_hashes),
                ConfigResult::failure(config("b"), ExfigError::Export("boom".to_string())),
                ConfigResult::success(config("c"), ExportStats::new(3, 5, 0, 0)),
            ],
            Vec::new(),
            now,
            now,
        );

        let totals = result.total_stats();
        assert_eq!((totals.colors, totals.icons), (13, 10));
        assert_eq!(totals.computed_hashes.len(), 1);
        assert_eq!(result.duration, Duration::ZERO);
    }

    #[test]
    fn test_empty_batch_totals_are_zero() {
        let now = Utc::now();
        let result = BatchResult::new(Vec::new(), Vec::new(), now, now);
        assert_eq!(result.total_stats(), ExportStats::default());
        assert!(result.is_successful());
    }
}
