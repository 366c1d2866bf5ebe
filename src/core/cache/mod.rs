//! Two-tier export cache
//!
//! - **Tier 1** ([`ImageTrackingCache`]): skip a file entirely when its remote
//!   version matches the one recorded at the last export
//! - **Tier 2** ([`GranularCacheManager`]): for changed files, export only the
//!   nodes whose content hash differs
//!
//! During a batch the cache is read-only; every config sees the same
//! [`SharedGranularCache`] snapshot and results are merged once at the end.

pub mod granular;
pub mod hasher;
pub mod shared;
pub mod tracking;

pub use granular::{AssetNode, GranularCacheManager, GranularFilterResult, LightDarkFilterResult};
pub use hasher::{ContentHasher, VisualContentHasher};
pub use shared::SharedGranularCache;
pub use tracking::{CachedFileInfo, ImageTrackingCache, CACHE_SCHEMA_VERSION};
