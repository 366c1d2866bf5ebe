//! Rate-limited, retrying wrapper around a [`RemoteClient`]

use super::{Endpoint, RemoteClient, RemoteRequest};
use crate::core::rate_limit::SharedRateLimiter;
use crate::core::retry::{RetryAttempt, RetryPolicy, DEFAULT_RATE_LIMIT_PAUSE};
use crate::domain::errors::{ExfigError, RemoteError};
use crate::domain::events::{BatchEvent, EventSink};
use crate::domain::ids::{FileId, NodeId};
use crate::domain::metadata::FileMetadata;
use crate::domain::result::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on node ids sent in one nodes request.
const MAX_NODE_IDS_PER_REQUEST: usize = 100;

/// Remote client shared by every config of a batch
///
/// Each attempt waits for the shared [`SharedRateLimiter`], runs under the
/// configured timeout and reports 429 responses back to the limiter so all
/// workers pause together. Transient failures are retried per the
/// [`RetryPolicy`].
pub struct RateLimitedClient {
    inner: Arc<dyn RemoteClient>,
    limiter: Arc<SharedRateLimiter>,
    retry: RetryPolicy,
    timeout: Duration,
    events: Arc<dyn EventSink>,
}

impl RateLimitedClient {
    pub fn new(
        inner: Arc<dyn RemoteClient>,
        limiter: Arc<SharedRateLimiter>,
        retry: RetryPolicy,
        timeout: Duration,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            inner,
            limiter,
            retry,
            timeout,
            events,
        }
    }

    /// The shared limiter pacing this client
    pub fn limiter(&self) -> &Arc<SharedRateLimiter> {
        &self.limiter
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.is_authenticated()
    }

    /// Sends a request, retrying transient failures
    pub async fn request(&self, endpoint: Endpoint) -> std::result::Result<Value, RemoteError> {
        let request = RemoteRequest::new(endpoint, self.timeout);
        let request = &request;

        self.retry
            .execute(
                move || self.attempt(request),
                move |retry| self.report_retry(request, retry),
            )
            .await
    }

    /// Fetches lightweight metadata for a file
    pub async fn file_metadata(&self, file_id: &FileId) -> Result<FileMetadata> {
        let body = self.request(Endpoint::FileMetadata(file_id.clone())).await?;

        serde_json::from_value(body).map_err(|e| {
            ExfigError::Remote(RemoteError::InvalidResponse(format!(
                "file metadata for {file_id}: {e}"
            )))
        })
    }

    /// Fetches node documents, keyed by node id
    ///
    /// Nodes the remote API does not return (deleted, or answered with
    /// `null`) are absent from the map.
    pub async fn nodes(
        &self,
        file_id: &FileId,
        node_ids: &[NodeId],
    ) -> Result<HashMap<NodeId, Value>> {
        let mut documents = HashMap::with_capacity(node_ids.len());

        for chunk in node_ids.chunks(MAX_NODE_IDS_PER_REQUEST) {
            let body = self
                .request(Endpoint::Nodes {
                    file_id: file_id.clone(),
                    node_ids: chunk.to_vec(),
                })
                .await?;

            let nodes = body.get("nodes").and_then(Value::as_object).ok_or_else(|| {
                ExfigError::Remote(RemoteError::InvalidResponse(format!(
                    "nodes response for {file_id} has no 'nodes' object"
                )))
            })?;

            for (id, entry) in nodes {
                let Some(document) = entry.get("document") else {
                    continue;
                };
                match NodeId::new(id.as_str()) {
                    Ok(node_id) => {
                        documents.insert(node_id, document.clone());
                    }
                    Err(e) => tracing::debug!(node_id = %id, error = %e, "Ignoring malformed node id"),
                }
            }
        }

        Ok(documents)
    }

    async fn attempt(&self, request: &RemoteRequest) -> std::result::Result<Value, RemoteError> {
        self.limiter.acquire().await;

        let result = match tokio::time::timeout(request.timeout, self.inner.request(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout(request.timeout)),
        };

        if let Err(RemoteError::RateLimited { retry_after }) = &result {
            let pause = retry_after.unwrap_or(DEFAULT_RATE_LIMIT_PAUSE);
            self.limiter.report_rate_limited(pause);
            self.events.emit(BatchEvent::RateLimited { retry_after: pause });
        }

        result
    }

    fn report_retry(&self, request: &RemoteRequest, retry: &RetryAttempt) {
        tracing::debug!(
            path = %request.endpoint.path(),
            attempt = retry.attempt,
            max_attempts = retry.max_attempts,
            delay_ms = retry.delay.as_millis() as u64,
            "Retrying remote request"
        );
        self.events.emit(BatchEvent::Retrying {
            attempt: retry.attempt,
            max_attempts: retry.max_attempts,
            error: retry.error.to_string(),
            delay: retry.delay,
        });
    }
}
