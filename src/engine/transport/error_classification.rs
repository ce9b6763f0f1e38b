//! Error classification helpers for transport failures.
//!
//! This module converts low-level socket and HTTP errors into semantic
//! `EngineError` variants so callers receive actionable diagnostics.

use std::io;
use std::path::Path;

use crate::engine::endpoint::Endpoint;
use crate::error::EngineError;

/// Classify an I/O error kind into a semantic `EngineError`.
///
/// Maps specific `ErrorKind` variants to their corresponding `EngineError`
/// variants when a socket path is available, falling back to `ConnectionFailed`
/// for other error kinds or when no path can be extracted.
fn classify_io_error_kind(
    kind: io::ErrorKind,
    socket_path: Option<&Path>,
    error_msg: &str,
) -> EngineError {
    match kind {
        io::ErrorKind::PermissionDenied => socket_path.map_or_else(
            || EngineError::ConnectionFailed {
                message: error_msg.to_owned(),
            },
            |path| EngineError::PermissionDenied {
                path: path.to_path_buf(),
            },
        ),
        io::ErrorKind::NotFound => socket_path.map_or_else(
            || EngineError::ConnectionFailed {
                message: error_msg.to_owned(),
            },
            |path| EngineError::SocketNotFound {
                path: path.to_path_buf(),
            },
        ),
        _ => EngineError::ConnectionFailed {
            message: error_msg.to_owned(),
        },
    }
}

/// Classify a failure to open the socket or TCP stream.
pub(super) fn classify_connect_error(error: &io::Error, endpoint: &Endpoint) -> EngineError {
    let message = format!("{endpoint}: {error}");
    let kind = io_error_kind_in_chain(error).unwrap_or_else(|| error.kind());
    classify_io_error_kind(kind, endpoint.socket_path(), &message)
}

/// Classify an error raised after the stream was connected.
///
/// Resets and broken pipes are reported as transport failures; refusals
/// buried in the chain still map to connection errors.
pub(super) fn classify_exchange_error(
    error: &(dyn std::error::Error + 'static),
    endpoint: &Endpoint,
) -> EngineError {
    let message = format!("{endpoint}: {error}");
    match io_error_kind_in_chain(error) {
        Some(io::ErrorKind::ConnectionRefused) => EngineError::ConnectionFailed { message },
        _ => EngineError::Transport { message },
    }
}

/// Walk the error source chain looking for an `io::Error` kind.
fn io_error_kind_in_chain(error: &(dyn std::error::Error + 'static)) -> Option<io::ErrorKind> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = error.source();
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        current = err.source();
    }
    None
}
