//! Orchestration helpers for dockyard commands.
//!
//! The connector exposes one method per daemon operation. Some commands need
//! several of them in sequence (create an exec, start it, wait for its exit
//! code); those sequences live here so the CLI adapter and library embedders
//! share them.
//!
//! Functions accept library-owned types (not clap types) and return
//! [`crate::error::Result<CommandOutcome>`]. They do not print to
//! stdout/stderr or call `std::process::exit`.

mod exec;

pub use exec::{ExecCommand, exec_and_wait};

use std::time::Duration;

use crate::engine::DockerConnector;
use crate::engine::models::ContainerStopped;
use crate::engine::params::StopContainerParams;
use crate::error::Result as DockyardResult;

/// Outcome of a dockyard command.
///
/// Commands return either outright success or a command-specific exit code
/// that the CLI adapter maps to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command completed successfully (exit code 0).
    Success,
    /// The command completed but the underlying process exited with a
    /// non-zero code.
    CommandExit {
        /// The exit code reported by the container engine.
        code: i64,
    },
}

impl CommandOutcome {
    /// Map a process exit code to an outcome.
    #[must_use]
    pub const fn from_exit_code(code: i64) -> Self {
        if code == 0 {
            Self::Success
        } else {
            Self::CommandExit { code }
        }
    }
}

/// Stop a container, treating an already stopped container as success.
///
/// # Errors
///
/// Returns the engine error if the daemon rejects the request or cannot be
/// reached.
pub async fn stop_container(
    connector: &DockerConnector,
    container: &str,
    timeout: Option<Duration>,
) -> DockyardResult<CommandOutcome> {
    let mut params = StopContainerParams::new(container);
    if let Some(grace) = timeout {
        params = params.with_timeout(grace);
    }
    if connector.stop_container(&params).await? == ContainerStopped::AlreadyStopped {
        tracing::info!(container, "container was not running");
    }
    Ok(CommandOutcome::Success)
}
