//! Domain error types
//!
//! This module defines the error hierarchy for ExFig.
//! All errors are domain-specific and don't expose third-party types.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main ExFig error type
///
/// This is the primary error type used throughout the library.
/// Per-config failures are captured as `ConfigResult::Failure` carrying one of
/// these; only discovery-time and setup-time errors escape a batch run.
#[derive(Debug, Error)]
pub enum ExfigError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Config discovery errors
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Remote API errors
    #[error("Remote API error: {0}")]
    Remote(#[from] RemoteError),

    /// Asset tracking cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Checkpoint persistence errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Export pipeline errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised while locating config files
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The directory to scan does not exist
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// An explicitly requested config file does not exist
    #[error("Config file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Nothing usable was found
    #[error("No config files found in {0}")]
    NoConfigsFound(String),
}

/// Remote API errors
///
/// Errors surfaced by the remote request capability. These errors don't expose
/// the transport's own types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The request did not complete within the configured timeout
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded, retry after: {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Failed to reach the server
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed (401/403)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Client error (4xx other than 429)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Response could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Whether repeating the request may succeed.
    ///
    /// Timeouts, 5xx responses, rate limiting and dropped connections are
    /// transient. Authentication failures and malformed requests are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Timeout(_)
            | RemoteError::ServerError { .. }
            | RemoteError::RateLimited { .. }
            | RemoteError::ConnectionFailed(_) => true,
            RemoteError::AuthenticationFailed(_)
            | RemoteError::ClientError { .. }
            | RemoteError::InvalidResponse(_) => false,
        }
    }

    /// Builds an error from an HTTP status code and response body.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => RemoteError::AuthenticationFailed(message),
            429 => RemoteError::RateLimited { retry_after: None },
            500..=599 => RemoteError::ServerError { status, message },
            _ => RemoteError::ClientError { status, message },
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ExfigError {
    fn from(err: std::io::Error) -> Self {
        ExfigError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ExfigError {
    fn from(err: serde_json::Error) -> Self {
        ExfigError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ExfigError {
    fn from(err: toml::de::Error) -> Self {
        ExfigError::Configuration(format!("TOML parse error: {err}"))
    }
}
