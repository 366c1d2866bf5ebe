//! Core business logic for ExFig.
//!
//! # Modules
//!
//! - [`batch`] - Batch orchestration, bounded-parallel execution and results
//! - [`cache`] - Version tracking cache and node-level change detection
//! - [`discovery`] - Config discovery, validation and file-id extraction
//! - [`prefetch`] - Up-front retrieval of remote file versions
//! - [`rate_limit`] - Token bucket shared by every worker
//! - [`retry`] - Exponential backoff for transient remote failures
//! - [`state`] - Checkpointing for resumable batches
//!
//! # Batch Workflow
//!
//! 1. **Discover**: find config files and drop those that are not configs
//! 2. **Checkpoint**: resume a recent interrupted run when asked to
//! 3. **Pre-fetch**: fetch the version of every referenced remote file once
//! 4. **Dispatch**: run configs with at most `max_parallel` in flight
//! 5. **Persist**: merge successful configs into the tracking cache
//!
//! # Example
//!
//! ```rust,no_run
//! use exfig::config::load_settings;
//! use exfig::core::batch::{BatchCoordinator, BatchInputs, ConfigExporter};
//! use exfig::adapters::remote::RemoteClient;
//! use exfig::logging::TracingEventSink;
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     remote: Arc<dyn RemoteClient>,
//! #     exporter: Arc<dyn ConfigExporter>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let settings = load_settings("exfig.toml")?;
//! let coordinator =
//!     BatchCoordinator::new(settings, remote, exporter, Arc::new(TracingEventSink))?;
//!
//! let result = coordinator.run(BatchInputs::Directory("configs".into())).await?;
//! println!("Succeeded: {}", result.success_count());
//! println!("Failed: {}", result.failure_count());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cache;
pub mod discovery;
pub mod prefetch;
pub mod rate_limit;
pub mod retry;
pub mod state;
