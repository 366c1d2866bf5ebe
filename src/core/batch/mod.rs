//! Batch export engine
//!
//! - [`coordinator`] - end-to-end orchestration of a batch run
//! - [`executor`] - bounded-parallel dispatch with fail-fast
//! - [`runner`] - one config's export pipeline
//! - [`context`] - shared resources and per-config view of them
//! - [`options`] - run options built from settings
//! - [`result`] - per-config and per-batch results

pub mod context;
pub mod coordinator;
pub mod executor;
pub mod options;
pub mod result;
pub mod runner;

pub use context::{BatchResources, ExportContext, FileVersionCheck};
pub use coordinator::{BatchCoordinator, BatchInputs};
pub use executor::{BatchExecutor, ExecutorState};
pub use options::{CacheOptions, ConfigRunOptions, ExecutorOptions};
pub use result::{BatchResult, ConfigResult};
pub use runner::{BatchConfigRunner, ConfigExporter};
