// ExFig - Batch export of design assets
// Copyright (c) 2025 ExFig Contributors
// Licensed under the MIT License

//! # ExFig - batch export engine
//!
//! ExFig runs many export configs against a rate-limited remote design API in
//! one invocation, sharing one request budget, one set of pre-fetched file
//! versions and one change-tracking cache across every config.
//!
//! ## Overview
//!
//! - **Discovering** config files in a directory or from explicit paths
//! - **Pacing** every outbound request through one shared token bucket, with a
//!   global pause when the API answers 429
//! - **Retrying** transient failures with capped exponential backoff
//! - **Skipping** unchanged work: whole files by version, single assets by a
//!   hash of their visual content
//! - **Resuming** an interrupted batch from its checkpoint
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface (`discover`, `status`)
//! - [`core`] - Batch engine (executor, cache, discovery, rate limiting, retry, state)
//! - [`adapters`] - Remote API request capability and the rate-limited client
//! - [`domain`] - Core domain types, events and errors
//! - [`config`] - Engine settings
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! The exporter (writing generated files) and the HTTP transport are supplied
//! by the caller:
//!
//! ```rust,no_run
//! use exfig::adapters::remote::{RemoteClient, RemoteRequest};
//! use exfig::config::load_settings;
//! use exfig::core::batch::{BatchCoordinator, BatchInputs, ConfigExporter, ExportContext};
//! use exfig::domain::{ExportStats, RemoteError, Result};
//! use exfig::logging::TracingEventSink;
//! use std::sync::Arc;
//!
//! struct Transport;
//!
//! #[async_trait::async_trait]
//! impl RemoteClient for Transport {
//!     async fn request(
//!         &self,
//!         request: &RemoteRequest,
//!     ) -> std::result::Result<serde_json::Value, RemoteError> {
//!         unimplemented!("GET {}", request.endpoint.path())
//!     }
//! }
//!
//! struct Generator;
//!
//! #[async_trait::async_trait]
//! impl ConfigExporter for Generator {
//!     async fn export(&self, _ctx: &ExportContext) -> Result<ExportStats> {
//!         Ok(ExportStats::default())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = load_settings("exfig.toml")?;
//!     let coordinator = BatchCoordinator::new(
//!         settings,
//!         Arc::new(Transport),
//!         Arc::new(Generator),
//!         Arc::new(TracingEventSink),
//!     )?;
//!
//!     let result = coordinator.run(BatchInputs::Directory("configs".into())).await?;
//!     println!("{} succeeded, {} failed", result.success_count(), result.failure_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Per-config failures never abort a batch; they are returned as
//! [`core::batch::ConfigResult::Failure`]. Only setup problems surface as
//! [`domain::ExfigError`] from [`core::batch::BatchCoordinator::run`].
//!
//! ## Logging
//!
//! Everything is logged through `tracing` with structured fields. Batch
//! warnings are also delivered as [`domain::BatchEvent`]s to the injected
//! [`domain::EventSink`]; [`logging::TracingEventSink`] turns them into log
//! records.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
