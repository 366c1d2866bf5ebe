//! Event sink that reports batch events through tracing

use crate::domain::events::{BatchEvent, EventSink};

/// Writes every [`BatchEvent`] as a structured log record
///
/// Warnings a user should act on are logged at `warn`; progress at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: BatchEvent) {
        match event {
            BatchEvent::Retrying {
                attempt,
                max_attempts,
                error,
                delay,
            } => {
                crate::log_retry_attempt!(attempt, max_attempts, error, delay);
            }
            BatchEvent::RateLimited { retry_after } => {
                tracing::warn!(
                    retry_after_ms = retry_after.as_millis() as u64,
                    "Rate limited by remote API, pausing all requests"
                );
            }
            BatchEvent::PrefetchPartiallyFailed { failed, fetched } => {
                let failed: Vec<String> = failed.iter().map(ToString::to_string).collect();
                tracing::warn!(
                    fetched,
                    failed = ?failed,
                    "Some file versions could not be pre-fetched"
                );
            }
            BatchEvent::CheckpointExpired { age_hours } => {
                tracing::warn!(age_hours, "Checkpoint expired, starting a fresh batch");
            }
            BatchEvent::CheckpointMismatched => {
                tracing::warn!("Checkpoint belongs to a different set of configs, starting a fresh batch");
            }
            BatchEvent::CheckpointUnreadable { reason } => {
                tracing::warn!(reason = %reason, "Checkpoint unreadable, starting a fresh batch");
            }
            BatchEvent::ResumingFromCheckpoint {
                completed,
                remaining,
            } => {
                tracing::info!(completed, remaining, "Resuming from checkpoint");
            }
            BatchEvent::CacheDiscarded { path, reason } => {
                tracing::warn!(path = %path.display(), reason = %reason, "Tracking cache discarded");
            }
            BatchEvent::GranularCacheMisconfigured { reason } => {
                tracing::warn!(reason = %reason, "Granular cache disabled");
            }
            BatchEvent::InvalidConfigsSkipped { count } => {
                tracing::warn!(count, "Skipped files that are not configs");
            }
            BatchEvent::OutputPathConflict(conflict) => {
                tracing::warn!(
                    path = %conflict.path.display(),
                    configs = ?conflict.config_names(),
                    "Output path shared by several configs"
                );
            }
            BatchEvent::FailFastTriggered { config } => {
                tracing::warn!(config = %config, "Fail-fast: no further configs will start");
            }
        }
    }
}
