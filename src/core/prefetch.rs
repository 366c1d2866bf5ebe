//! Batch-wide file version pre-fetch
//!
//! Many configs reference the same few remote files. Fetching each file's
//! metadata once, before dispatch, removes the duplicate version checks that
//! would otherwise eat into the shared rate limit.

use crate::adapters::remote::RateLimitedClient;
use crate::domain::events::{BatchEvent, EventSink};
use crate::domain::ids::FileId;
use crate::domain::metadata::FileMetadata;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;

/// Metadata fetched before dispatch, keyed by file id
///
/// Immutable once built; configs read it concurrently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreFetchedFileVersions {
    versions: HashMap<FileId, FileMetadata>,
}

impl PreFetchedFileVersions {
    pub fn new(versions: HashMap<FileId, FileMetadata>) -> Self {
        Self { versions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetches metadata for every id with at most `concurrency` requests in
    /// flight.
    ///
    /// Failures are not fatal: affected files are left out (configs fall back
    /// to fetching on demand) and one `PrefetchPartiallyFailed` event lists
    /// them.
    pub async fn fetch(
        client: &RateLimitedClient,
        file_ids: &[FileId],
        concurrency: usize,
        events: &dyn EventSink,
    ) -> Self {
        if file_ids.is_empty() {
            return Self::empty();
        }

        let results: Vec<_> = stream::iter(file_ids.iter().cloned())
            .map(|file_id| async move {
                let result = client.file_metadata(&file_id).await;
                (file_id, result)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let mut versions = HashMap::with_capacity(results.len());
        let mut failed = Vec::new();
        for (file_id, result) in results {
            match result {
                Ok(metadata) => {
                    versions.insert(file_id, metadata);
                }
                Err(e) => {
                    tracing::warn!(file_id = %file_id, error = %e, "Failed to pre-fetch file version");
                    failed.push(file_id);
                }
            }
        }

        tracing::info!(
            requested = file_ids.len(),
            fetched = versions.len(),
            failed = failed.len(),
            "File versions pre-fetched"
        );

        if !failed.is_empty() {
            failed.sort();
            events.emit(BatchEvent::PrefetchPartiallyFailed {
                failed,
                fetched: versions.len(),
            });
        }

        Self { versions }
    }

    pub fn metadata(&self, file_id: &FileId) -> Option<&FileMetadata> {
        self.versions.get(file_id)
    }

    pub fn has_metadata(&self, file_id: &FileId) -> bool {
        self.versions.contains_key(file_id)
    }

    pub fn count(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl FromIterator<(FileId, FileMetadata)> for PreFetchedFileVersions {
    fn from_iter<I: IntoIterator<Item = (FileId, FileMetadata)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
