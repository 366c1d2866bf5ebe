//! Remote design API integration
//!
//! The engine talks to the design service through the [`RemoteClient`] trait.
//! Transport details (HTTP, authentication headers, endpoints) belong to the
//! implementation; the engine only sees JSON payloads and [`RemoteError`]s.
//!
//! Every request a batch issues goes through [`RateLimitedClient`], which adds
//! the shared rate limiter, per-request timeout and retry policy on top of the
//! raw client.

pub mod rate_limited;

pub use rate_limited::RateLimitedClient;

use crate::domain::errors::RemoteError;
use crate::domain::ids::{FileId, NodeId};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// A remote API endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Lightweight file metadata (name, version, last modification)
    FileMetadata(FileId),

    /// Documents for a set of nodes within a file
    Nodes {
        file_id: FileId,
        node_ids: Vec<NodeId>,
    },

    /// Any other path, relative to the API root
    Raw(String),
}

impl Endpoint {
    /// Path of the endpoint relative to the API root
    ///
    /// ```
    /// use exfig::adapters::remote::Endpoint;
    /// use exfig::domain::FileId;
    ///
    /// let endpoint = Endpoint::FileMetadata(FileId::new("abc123").unwrap());
    /// assert_eq!(endpoint.path(), "/v1/files/abc123?depth=1");
    /// ```
    pub fn path(&self) -> String {
        match self {
            Endpoint::FileMetadata(file_id) => format!("/v1/files/{file_id}?depth=1"),
            Endpoint::Nodes { file_id, node_ids } => {
                let ids: Vec<&str> = node_ids.iter().map(NodeId::as_str).collect();
                format!("/v1/files/{file_id}/nodes?ids={}", ids.join(","))
            }
            Endpoint::Raw(path) => path.clone(),
        }
    }
}

/// One request to the remote API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    pub endpoint: Endpoint,
    pub timeout: Duration,
}

impl RemoteRequest {
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }
}

/// Raw access to the remote API
///
/// Implementations perform a single attempt and map transport failures onto
/// [`RemoteError`]. Retrying, pacing and timeouts are layered on by
/// [`RateLimitedClient`].
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Performs one request and returns the decoded JSON body
    async fn request(&self, request: &RemoteRequest) -> Result<Value, RemoteError>;

    /// Whether the client holds credentials
    fn is_authenticated(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_endpoint_path() {
        let endpoint = Endpoint::Nodes {
            file_id: FileId::new("file1").unwrap(),
            node_ids: vec![NodeId::new("1:2").unwrap(), NodeId::new("3:4").unwrap()],
        };
        assert_eq!(endpoint.path(), "/v1/files/file1/nodes?ids=1:2,3:4");
    }

    #[test]
    fn test_raw_endpoint_path() {
        let endpoint = Endpoint::Raw("/v1/me".to_string());
        assert_eq!(endpoint.path(), "/v1/me");
    }
}
