//! Structured warning/event stream
//!
//! The engine never prints. Everything a reporting layer may want to show is
//! emitted as a [`BatchEvent`] to an injected [`EventSink`].

use crate::domain::config_file::OutputPathConflict;
use crate::domain::ids::FileId;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Events emitted while a batch runs
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// A transient remote failure is about to be retried
    Retrying {
        attempt: usize,
        max_attempts: usize,
        error: String,
        delay: Duration,
    },

    /// The remote API answered 429; all requests pause for `retry_after`
    RateLimited { retry_after: Duration },

    /// Metadata could not be pre-fetched for some files
    PrefetchPartiallyFailed { failed: Vec<FileId>, fetched: usize },

    /// The stored checkpoint was older than the resume window
    CheckpointExpired { age_hours: i64 },

    /// The stored checkpoint was written for a different set of configs
    CheckpointMismatched,

    /// The stored checkpoint could not be read
    CheckpointUnreadable { reason: String },

    /// Configs completed by an earlier run are skipped
    ResumingFromCheckpoint { completed: usize, remaining: usize },

    /// The tracking cache on disk could not be used
    CacheDiscarded { path: PathBuf, reason: String },

    /// Granular caching was requested in a setup where it cannot work
    GranularCacheMisconfigured { reason: String },

    /// Files that did not look like configs were left out
    InvalidConfigsSkipped { count: usize },

    /// Several configs write to the same output path
    OutputPathConflict(OutputPathConflict),

    /// A failure stopped further dispatch
    FailFastTriggered { config: String },
}

/// Receiver of batch events
pub trait EventSink: Send + Sync {
    /// Deliver one event
    fn emit(&self, event: BatchEvent);
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<BatchEvent>>,
}

impl RecordingEventSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<BatchEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether any received event satisfies `predicate`
    pub fn contains(&self, predicate: impl Fn(&BatchEvent) -> bool) -> bool {
        self.events().iter().any(predicate)
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: BatchEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingEventSink::new();
        sink.emit(BatchEvent::CheckpointMismatched);
        sink.emit(BatchEvent::InvalidConfigsSkipped { count: 2 });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], BatchEvent::CheckpointMismatched);
        assert!(sink.contains(|e| matches!(e, BatchEvent::InvalidConfigsSkipped { count: 2 })));
    }
}
