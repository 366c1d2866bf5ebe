//! Error context extension trait
//!
//! Provides `.context()` and `.with_context()` on any `Result` whose error
//! converts into [`ExfigError`], similar to `anyhow::Context` but keeping the
//! library's own error type.
//!
//! ```rust
//! use exfig::domain::Result;
//! use exfig::domain::context::ResultExt;
//!
//! fn read_cache(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(|| format!("Failed to read cache {path}"))
//! }
//! ```

use crate::domain::errors::ExfigError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error (evaluated eagerly)
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error, computed only when an error occurs
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ExfigError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| {
            let base_error = e.into();
            ExfigError::Other(format!("{context}: {base_error}"))
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let base_error = e.into();
            let context = f();
            ExfigError::Other(format!("{context}: {base_error}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::RemoteError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_context_with_exfig_error() {
        let result: Result<()> = Err(ExfigError::Cache("schema mismatch".to_string()));
        let err_msg = result
            .context("Failed to load cache")
            .unwrap_err()
            .to_string();

        assert!(err_msg.contains("Failed to load cache"));
        assert!(err_msg.contains("schema mismatch"));
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let result: Result<i32> = Ok(42);
        let with_context = result.with_context(|| {
            called_clone.store(true, Ordering::SeqCst);
            "Expensive context"
        });

        assert!(with_context.is_ok());
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_context_with_remote_error() {
        let result: std::result::Result<(), RemoteError> =
            Err(RemoteError::ConnectionFailed("reset by peer".to_string()));
        let err_msg = result
            .context("Failed to fetch file abc123")
            .unwrap_err()
            .to_string();

        assert!(err_msg.contains("Failed to fetch file abc123"));
        assert!(err_msg.contains("reset by peer"));
    }

    #[test]
    fn test_io_error_with_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let result: std::result::Result<(), std::io::Error> = Err(io_error);
        let err_msg = result
            .context("Failed to read checkpoint")
            .unwrap_err()
            .to_string();

        assert!(err_msg.contains("Failed to read checkpoint"));
        assert!(err_msg.contains("File not found"));
    }
}
