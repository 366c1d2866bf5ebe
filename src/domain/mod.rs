//! Domain models and types for ExFig.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`FileId`], [`NodeId`])
//! - **Batch data model** ([`ConfigFile`], [`ExportStats`], [`GranularCacheStats`],
//!   [`FileMetadata`], [`OutputPathConflict`])
//! - **Events** ([`BatchEvent`], [`EventSink`])
//! - **Error types** ([`ExfigError`], [`DiscoveryError`], [`RemoteError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ExfigError>`]:
//!
//! ```rust
//! use exfig::domain::{ExfigError, FileId, Result};
//!
//! fn parse_file_id(raw: &str) -> Result<FileId> {
//!     FileId::new(raw).map_err(ExfigError::Validation)
//! }
//! # assert!(parse_file_id("abc").is_ok());
//! ```

pub mod config_file;
pub mod context;
pub mod errors;
pub mod events;
pub mod ids;
pub mod metadata;
pub mod result;
pub mod stats;

// Re-export commonly used types for convenience
pub use config_file::{ConfigFile, OutputPathConflict};
pub use errors::{DiscoveryError, ExfigError, RemoteError};
pub use events::{BatchEvent, EventSink, RecordingEventSink};
pub use ids::{FileId, NodeId};
pub use metadata::FileMetadata;
pub use result::Result;
pub use stats::{ExportStats, FileNodeHashes, GranularCacheStats, NodeHash};
