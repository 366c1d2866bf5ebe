//! Checkpoint persistence
//!
//! The [`CheckpointManager`] is the single writer of the checkpoint file.
//! Config tasks report completions through it; a mutex serializes updates so
//! the file always holds a consistent snapshot.

use super::checkpoint::BatchCheckpoint;
use crate::domain::config_file::ConfigFile;
use crate::domain::errors::ExfigError;
use crate::domain::events::{BatchEvent, EventSink};
use crate::domain::result::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Loads, updates and removes the checkpoint file of a batch
pub struct CheckpointManager {
    path: PathBuf,
    current: Mutex<Option<BatchCheckpoint>>,
}

impl CheckpointManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a checkpoint file
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// `ExfigError::Checkpoint` if the file cannot be read or decoded.
    pub fn read(path: impl AsRef<Path>) -> Result<Option<BatchCheckpoint>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExfigError::Checkpoint(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let checkpoint = serde_json::from_str(&contents).map_err(|e| {
            ExfigError::Checkpoint(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Some(checkpoint))
    }

    /// Starts tracking a batch over `configs`
    ///
    /// With `resume`, a stored checkpoint for the same configs that is younger
    /// than the resume window is continued. Expired, mismatched and unreadable
    /// checkpoints are deleted with an event and a fresh one is started.
    pub async fn begin(
        &self,
        configs: &[ConfigFile],
        resume: bool,
        events: &dyn EventSink,
    ) -> Result<BatchCheckpoint> {
        let resumed = if resume {
            self.load_for_resume(configs, events).await?
        } else {
            None
        };

        let checkpoint = match resumed {
            Some(checkpoint) => {
                let remaining = configs
                    .iter()
                    .filter(|c| !checkpoint.is_completed(c))
                    .count();
                tracing::info!(
                    run_id = %checkpoint.run_id,
                    completed = checkpoint.completed_count(),
                    remaining,
                    "Resuming batch from checkpoint"
                );
                events.emit(BatchEvent::ResumingFromCheckpoint {
                    completed: checkpoint.completed_count(),
                    remaining,
                });
                checkpoint
            }
            None => BatchCheckpoint::new(configs),
        };

        let mut current = self.current.lock().await;
        self.write(&checkpoint).await?;
        *current = Some(checkpoint.clone());
        Ok(checkpoint)
    }

    async fn load_for_resume(
        &self,
        configs: &[ConfigFile],
        events: &dyn EventSink,
    ) -> Result<Option<BatchCheckpoint>> {
        let checkpoint = match Self::read(&self.path) {
            Ok(Some(checkpoint)) => checkpoint,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable checkpoint");
                events.emit(BatchEvent::CheckpointUnreadable {
                    reason: e.to_string(),
                });
                self.remove().await?;
                return Ok(None);
            }
        };

        let now = Utc::now();
        if checkpoint.is_expired_at(now) {
            let age_hours = checkpoint.age_at(now).num_hours();
            tracing::warn!(age_hours, "Discarding expired checkpoint");
            events.emit(BatchEvent::CheckpointExpired { age_hours });
            self.remove().await?;
            return Ok(None);
        }

        if !checkpoint.matches(configs) {
            tracing::warn!("Discarding checkpoint written for different configs");
            events.emit(BatchEvent::CheckpointMismatched);
            self.remove().await?;
            return Ok(None);
        }

        Ok(Some(checkpoint))
    }

    /// Records a successful config and persists the checkpoint
    pub async fn mark_completed(&self, config: &ConfigFile) -> Result<()> {
        let mut current = self.current.lock().await;
        let Some(checkpoint) = current.as_mut() else {
            return Err(ExfigError::Checkpoint(
                "mark_completed called before begin".to_string(),
            ));
        };

        checkpoint.mark_completed(config);
        self.write(checkpoint).await
    }

    /// Copy of the tracked checkpoint
    pub async fn snapshot(&self) -> Option<BatchCheckpoint> {
        self.current.lock().await.clone()
    }

    /// Ends tracking; the file is removed when nothing failed
    pub async fn finish(&self, failure_count: usize) -> Result<()> {
        let mut current = self.current.lock().await;
        if failure_count == 0 {
            *current = None;
            self.remove().await?;
            tracing::debug!(path = %self.path.display(), "Checkpoint cleared");
        } else if let Some(checkpoint) = current.as_ref() {
            self.write(checkpoint).await?;
            tracing::info!(
                path = %self.path.display(),
                failures = failure_count,
                "Checkpoint kept for resume"
            );
        }
        Ok(())
    }

    async fn write(&self, checkpoint: &BatchCheckpoint) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(checkpoint)?;
        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        tokio::fs::write(&tmp, json).await.map_err(|e| {
            ExfigError::Checkpoint(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            ExfigError::Checkpoint(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }

    async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExfigError::Checkpoint(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
