//! Logging and observability
//!
//! - Console logs plus optional JSON file logs with rotation
//! - Configurable log levels, overridable through `RUST_LOG`
//! - [`TracingEventSink`] to surface batch events as log records
//!
//! # Example
//!
//! ```no_run
//! use exfig::logging::init_logging;
//! use exfig::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod events;
pub mod structured;

pub use events::TracingEventSink;
pub use structured::{init_logging, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use exfig::log_retry_attempt;
/// use std::time::Duration;
///
/// log_retry_attempt!(2, 4, "Connection timeout", Duration::from_secs(2));
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr, $delay:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            delay_ms = $delay.as_millis() as u64,
            "Retrying request"
        );
    };
}

/// Log the completion of a config export
///
/// # Example
///
/// ```no_run
/// use exfig::log_config_complete;
/// use std::time::Duration;
///
/// log_config_complete!("ios", 42, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_config_complete {
    ($config:expr, $count:expr, $duration:expr) => {
        tracing::info!(
            config = %$config,
            exported = $count,
            duration_ms = $duration.as_millis() as u64,
            "Config exported"
        );
    };
}
