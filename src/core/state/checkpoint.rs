//! Batch checkpoint model
//!
//! A checkpoint records which configs of a batch already finished
//! successfully, so an interrupted batch can be resumed instead of restarted.
//!
//! # Examples
//!
//! ```
//! use exfig::core::state::BatchCheckpoint;
//! use exfig::domain::ConfigFile;
//!
//! let configs = vec![ConfigFile::new("a.pkl"), ConfigFile::new("b.pkl")];
//! let mut checkpoint = BatchCheckpoint::new(&configs);
//! checkpoint.mark_completed(&configs[0]);
//!
//! assert!(checkpoint.is_completed(&configs[0]));
//! assert_eq!(checkpoint.remaining(), 1);
//! assert!(checkpoint.matches(&configs));
//! ```

use crate::domain::config_file::ConfigFile;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use uuid::Uuid;

/// Checkpoints older than this are discarded instead of resumed
pub const CHECKPOINT_TTL_HOURS: i64 = 24;

/// Progress of one batch invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCheckpoint {
    /// Identifier of the run that created the checkpoint
    pub run_id: Uuid,

    /// When the run started
    pub created_at: DateTime<Utc>,

    /// Last time progress was recorded
    pub updated_at: DateTime<Utc>,

    /// Every config path of the invocation
    pub config_paths: BTreeSet<PathBuf>,

    /// Config paths that finished successfully
    #[serde(default)]
    pub completed: BTreeSet<PathBuf>,
}

impl BatchCheckpoint {
    /// Fresh checkpoint for `configs` with nothing completed
    pub fn new(configs: &[ConfigFile]) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            config_paths: configs.iter().map(|c| c.path.clone()).collect(),
            completed: BTreeSet::new(),
        }
    }

    /// Time since the run started
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Whether the checkpoint is past the resume window
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.age_at(now) > Duration::hours(CHECKPOINT_TTL_HOURS)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the checkpoint was written for exactly this set of configs
    pub fn matches(&self, configs: &[ConfigFile]) -> bool {
        let paths: BTreeSet<&PathBuf> = configs.iter().map(|c| &c.path).collect();
        paths.len() == self.config_paths.len()
            && paths.iter().all(|p| self.config_paths.contains(*p))
    }

    pub fn mark_completed(&mut self, config: &ConfigFile) {
        self.completed.insert(config.path.clone());
        self.updated_at = Utc::now();
    }

    pub fn is_completed(&self, config: &ConfigFile) -> bool {
        self.completed.contains(&config.path)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Configs still to run
    pub fn remaining(&self) -> usize {
        self.config_paths.difference(&self.completed).count()
    }
}
