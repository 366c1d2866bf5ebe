//! Remote file metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of a remote design file
///
/// Decoded from the file-metadata endpoint, which returns more fields than
/// these; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// File name as shown in the design tool
    pub name: String,

    /// Opaque version identifier; changes whenever the file is saved
    pub version: String,

    /// Last modification time
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl FileMetadata {
    /// Create metadata without a modification time
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            last_modified: None,
        }
    }
}
