//! Semantic error types for dockyard.
//!
//! This module defines the error hierarchy, following the principle of using
//! semantic error enums (via `thiserror`) for conditions the caller might
//! inspect, retry, or map to a status, while reserving opaque errors
//! (`eyre::Report`) for the application boundary.
//!
//! [`EngineError`] separates failures the daemon reported from failures to
//! reach the daemon at all, so callers can decide whether a retry makes sense.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found at the expected path.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path where the configuration file was expected.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors raised while talking to the container engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required parameter was missing or empty. Raised before any I/O.
    #[error("invalid argument for {operation}: {message}")]
    InvalidArgument {
        /// The operation that rejected its parameters.
        operation: &'static str,
        /// What was wrong with the input.
        message: String,
    },

    /// The daemon answered with a status the operation does not accept.
    #[error("error response from daemon, status: {status}, message: {message}")]
    Daemon {
        /// The HTTP status code returned by the daemon.
        status: u16,
        /// Human-readable message extracted from the diagnostic body.
        message: String,
        /// The diagnostic body exactly as the daemon sent it.
        raw: String,
    },

    /// Failed to connect to the container engine.
    #[error("failed to connect to container engine: {message}")]
    ConnectionFailed {
        /// A description of the connection failure.
        message: String,
    },

    /// The container engine socket was not found.
    #[error("container engine socket not found: {path}")]
    SocketNotFound {
        /// The path where the socket was expected.
        path: PathBuf,
    },

    /// Permission denied when accessing the container engine socket.
    #[error("permission denied accessing container socket: {path}")]
    PermissionDenied {
        /// The path to the socket.
        path: PathBuf,
    },

    /// The connection failed after it was established (reset, early EOF,
    /// malformed HTTP).
    #[error("transport failure: {message}")]
    Transport {
        /// A description of the transport failure.
        message: String,
    },

    /// A response body did not have the expected shape.
    #[error("failed to parse daemon response: {message}")]
    Parse {
        /// A description of the mismatch.
        message: String,
    },

    /// TLS material could not be loaded or the handshake setup failed.
    #[error("TLS configuration failed: {message}")]
    Tls {
        /// A description of the TLS failure.
        message: String,
    },

    /// The caller cancelled a streaming operation.
    #[error("operation cancelled")]
    Cancelled,

    /// A streamed operation finished without producing its result marker.
    #[error("{operation}: {message}")]
    MissingResult {
        /// The operation that expected a result.
        operation: &'static str,
        /// Why no result is available.
        message: String,
    },

    /// Failed to create the async runtime for a blocking call.
    #[error("failed to create async runtime: {message}")]
    RuntimeCreationFailed {
        /// A description of the runtime creation failure.
        message: String,
    },

    /// The engine did not answer a ping in time.
    #[error("container engine health check timed out after {seconds} seconds")]
    HealthCheckTimeout {
        /// The timeout duration in seconds.
        seconds: u64,
    },
}

impl EngineError {
    /// Build a daemon error from a status code and raw diagnostic body.
    ///
    /// When the body is a JSON object with a `message` field that field
    /// becomes the human-readable message; otherwise the trimmed body is used.
    #[must_use]
    pub fn daemon(status: u16, raw: impl Into<String>) -> Self {
        let raw_text = raw.into();
        let message = serde_json::from_str::<serde_json::Value>(&raw_text)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| raw_text.trim().to_owned());
        Self::Daemon {
            status,
            message,
            raw: raw_text,
        }
    }

    /// Shorthand for an [`EngineError::InvalidArgument`].
    #[must_use]
    pub fn invalid_argument(operation: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation,
            message: message.into(),
        }
    }

    /// Returns the daemon status code for [`EngineError::Daemon`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Daemon { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw daemon diagnostic for [`EngineError::Daemon`].
    #[must_use]
    pub fn raw_message(&self) -> Option<&str> {
        match self {
            Self::Daemon { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Whether the daemon could not be reached or the exchange broke down.
    ///
    /// Parse errors count as transport problems because they indicate a
    /// protocol mismatch rather than a rejection.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::SocketNotFound { .. }
                | Self::PermissionDenied { .. }
                | Self::Transport { .. }
                | Self::Parse { .. }
                | Self::HealthCheckTimeout { .. }
        )
    }

    /// Whether this error records a caller-initiated cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Top-level error type for dockyard.
///
/// At the application boundary (main.rs) these errors are converted to
/// `eyre::Report` for human-readable error reporting.
#[derive(Debug, Error)]
pub enum DockyardError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred while talking to the container engine.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A specialised `Result` type for dockyard operations.
pub type Result<T> = std::result::Result<T, DockyardError>;
