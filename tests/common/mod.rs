//! Fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use exfig::adapters::remote::{Endpoint, RateLimitedClient, RemoteClient, RemoteRequest};
use exfig::config::{secret_string, ExfigSettings};
use exfig::core::rate_limit::SharedRateLimiter;
use exfig::core::retry::RetryPolicy;
use exfig::domain::{EventSink, RemoteError};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory design API: file versions and node documents
#[derive(Default)]
pub struct FakeRemote {
    versions: Mutex<HashMap<String, String>>,
    nodes: Mutex<HashMap<String, Value>>,
    metadata_calls: AtomicUsize,
    node_calls: AtomicUsize,
    authenticated: bool,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            authenticated: true,
            ..Self::default()
        }
    }

    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn set_version(&self, file_id: &str, version: &str) {
        self.versions
            .lock()
            .unwrap()
            .insert(file_id.to_string(), version.to_string());
    }

    pub fn set_node(&self, node_id: &str, document: Value) {
        self.nodes.lock().unwrap().insert(node_id.to_string(), document);
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn node_calls(&self) -> usize {
        self.node_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteClient for FakeRemote {
    async fn request(&self, request: &RemoteRequest) -> Result<Value, RemoteError> {
        match &request.endpoint {
            Endpoint::FileMetadata(file_id) => {
                self.metadata_calls.fetch_add(1, Ordering::SeqCst);
                let versions = self.versions.lock().unwrap();
                match versions.get(file_id.as_str()) {
                    Some(version) => Ok(json!({
                        "name": format!("File {file_id}"),
                        "version": version,
                        "lastModified": "2025-01-01T00:00:00Z",
                    })),
                    None => Err(RemoteError::ClientError {
                        status: 404,
                        message: format!("no file {file_id}"),
                    }),
                }
            }
            Endpoint::Nodes { node_ids, .. } => {
                self.node_calls.fetch_add(1, Ordering::SeqCst);
                let nodes = self.nodes.lock().unwrap();
                let mut body = Map::new();
                for node_id in node_ids {
                    let entry = match nodes.get(node_id.as_str()) {
                        Some(document) => json!({ "document": document }),
                        None => Value::Null,
                    };
                    body.insert(node_id.to_string(), entry);
                }
                Ok(json!({ "nodes": body }))
            }
            Endpoint::Raw(path) => Err(RemoteError::ClientError {
                status: 404,
                message: path.clone(),
            }),
        }
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// A rate-limited client over `remote` that never makes a test wait
pub fn fast_client(remote: Arc<dyn RemoteClient>, events: Arc<dyn EventSink>) -> RateLimitedClient {
    RateLimitedClient::new(
        remote,
        Arc::new(SharedRateLimiter::new(60_000, 1_000)),
        RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(5), 2.0),
        Duration::from_secs(5),
        events,
    )
}

/// Settings with a token, a fast limiter and state files inside `dir`
pub fn settings_in(dir: &Path) -> ExfigSettings {
    let mut settings = ExfigSettings::default();
    settings.remote.access_token = Some(secret_string("figd_test".to_string()));
    settings.rate_limit.requests_per_minute = 60_000;
    settings.rate_limit.burst_capacity = 1_000;
    settings.retry.initial_delay_ms = 1;
    settings.retry.max_delay_ms = 5;
    settings.batch.checkpoint_path = dir.join("checkpoint.json").display().to_string();
    settings.cache.path = dir.join("cache.json").display().to_string();
    settings
}

/// Writes an iOS config referencing `file_id` and writing to `output`
pub fn write_config(dir: &Path, name: &str, file_id: &str, output: &str) -> PathBuf {
    let path = dir.join(format!("{name}.pkl"));
    let contents = format!(
        r#"amends "package://exfig/ios.pkl"

ios {{
  xcassetsPath = "{output}"
}}

figma {{
  lightFileId = "{file_id}"
}}
"#
    );
    std::fs::write(&path, contents).unwrap();
    path
}
