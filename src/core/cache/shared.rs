//! Batch-wide read-only tracking cache, bound to the running task
//!
//! The coordinator loads the tracking cache once and hands every config the
//! same snapshot. Config runs see it through a task-local binding, so sibling
//! runs cannot observe each other's scope and nothing is stored in globals.
//! Work spawned from inside a run must use [`spawn_scoped`] to carry the
//! binding along.

use super::tracking::ImageTrackingCache;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Cheaply cloneable handle to the batch's cache snapshot
#[derive(Debug, Clone)]
pub struct SharedGranularCache {
    cache: Arc<ImageTrackingCache>,
    path: PathBuf,
}

impl SharedGranularCache {
    pub fn new(cache: ImageTrackingCache, path: impl Into<PathBuf>) -> Self {
        Self {
            cache: Arc::new(cache),
            path: path.into(),
        }
    }

    /// The snapshot loaded at batch start
    pub fn snapshot(&self) -> &ImageTrackingCache {
        &self.cache
    }

    /// Where the cache is persisted
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Owned copy for merging batch results before saving
    pub fn working_copy(&self) -> ImageTrackingCache {
        (*self.cache).clone()
    }

    /// Whether two handles share the same snapshot
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cache, &other.cache)
    }
}

tokio::task_local! {
    static CURRENT_CACHE: SharedGranularCache;
}

/// Runs `future` with `cache` bound for its whole execution
pub async fn scope<F: Future>(cache: SharedGranularCache, future: F) -> F::Output {
    CURRENT_CACHE.scope(cache, future).await
}

/// The cache bound to the current task, if any
pub fn current() -> Option<SharedGranularCache> {
    CURRENT_CACHE.try_with(Clone::clone).ok()
}

/// Spawns a task that inherits the current binding
pub fn spawn_scoped<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match current() {
        Some(cache) => tokio::spawn(CURRENT_CACHE.scope(cache, future)),
        None => tokio::spawn(future),
    }
}
