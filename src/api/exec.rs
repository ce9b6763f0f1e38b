//! Run a command in a container and wait for its exit code.

use std::time::Duration;

use crate::engine::DockerConnector;
use crate::engine::params::{CreateExecParams, ExecInfoParams, StartExecParams};
use crate::engine::pump::{BoxSink, LogMessage};
use crate::error::{EngineError, Result as DockyardResult};

use super::CommandOutcome;

/// Delay between exec inspections while the command is still running.
const EXEC_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A command to run inside a running container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCommand<'a> {
    /// Target container identifier or name.
    pub container: &'a str,
    /// Command argv to execute.
    pub command: Vec<String>,
    /// Whether to allocate a pseudo-terminal. The caller decides whether the
    /// local terminal supports one.
    pub tty: bool,
}

/// Execute a command in a running container and wait for it to finish.
///
/// With `output`, the command's output is streamed to the sink and the call
/// returns once the stream ends. Without it the exec runs detached and the
/// call polls until the daemon reports it finished.
///
/// # Errors
///
/// Returns `EngineError::InvalidArgument` for a blank container or empty
/// command, or the engine error raised by any of the create, start or
/// inspect requests.
pub async fn exec_and_wait(
    connector: &DockerConnector,
    request: ExecCommand<'_>,
    output: Option<BoxSink<LogMessage>>,
) -> DockyardResult<CommandOutcome> {
    let ExecCommand {
        container,
        command,
        tty,
    } = request;

    let create = CreateExecParams::new(container, command).with_tty(tty);
    let exec = connector.create_exec(&create).await?;

    let start = StartExecParams::new(exec.id.as_str()).with_tty(tty);
    if let Some(stream) = connector.start_exec(&start, output).await? {
        let outcome = stream.wait().await?;
        tracing::debug!(exec = %exec.id, ?outcome, "exec output finished");
    }

    let code = wait_for_exit(connector, &exec.id).await?;
    Ok(CommandOutcome::from_exit_code(code))
}

async fn wait_for_exit(connector: &DockerConnector, exec_id: &str) -> Result<i64, EngineError> {
    let params = ExecInfoParams::new(exec_id);
    loop {
        let info = connector.exec_info(&params).await?;
        if info.running != Some(true) {
            return Ok(info.exit_code.unwrap_or_default());
        }
        tokio::time::sleep(EXEC_POLL_INTERVAL).await;
    }
}
