//! Exec session parameters.

use super::{OperationParams, require_items, require_text};
use crate::error::EngineError;

/// Parameters for creating an exec session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateExecParams {
    pub(crate) container_id: String,
    pub(crate) command: Vec<String>,
    pub(crate) attach_stdout: bool,
    pub(crate) attach_stderr: bool,
    pub(crate) tty: Option<bool>,
}

impl CreateExecParams {
    /// Run `command` in the given container, capturing both output streams.
    #[must_use]
    pub fn new<I, S>(container_id: impl Into<String>, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            container_id: container_id.into(),
            command: command.into_iter().map(Into::into).collect(),
            attach_stdout: true,
            attach_stderr: true,
            tty: None,
        }
    }

    /// Choose which output streams to capture.
    #[must_use]
    pub const fn with_attach(mut self, stdout: bool, stderr: bool) -> Self {
        self.attach_stdout = stdout;
        self.attach_stderr = stderr;
        self
    }

    /// Allocate a pseudo terminal.
    #[must_use]
    pub const fn with_tty(mut self, tty: bool) -> Self {
        self.tty = Some(tty);
        self
    }
}

impl OperationParams for CreateExecParams {
    const OPERATION: &'static str = "create exec";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "container id", &self.container_id)?;
        require_items(Self::OPERATION, "command", &self.command)
    }
}

/// Parameters for starting an exec session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartExecParams {
    pub(crate) exec_id: String,
    pub(crate) detach: Option<bool>,
    pub(crate) tty: Option<bool>,
}

impl StartExecParams {
    /// Start the given exec session.
    #[must_use]
    pub fn new(exec_id: impl Into<String>) -> Self {
        Self {
            exec_id: exec_id.into(),
            detach: None,
            tty: None,
        }
    }

    /// Return as soon as the command starts.
    #[must_use]
    pub const fn with_detach(mut self, detach: bool) -> Self {
        self.detach = Some(detach);
        self
    }

    /// Match the session's terminal setting.
    #[must_use]
    pub const fn with_tty(mut self, tty: bool) -> Self {
        self.tty = Some(tty);
        self
    }
}

impl OperationParams for StartExecParams {
    const OPERATION: &'static str = "start exec";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "exec id", &self.exec_id)
    }
}

/// Parameters for inspecting an exec session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecInfoParams {
    pub(crate) exec_id: String,
}

impl ExecInfoParams {
    /// Inspect the given exec session.
    #[must_use]
    pub fn new(exec_id: impl Into<String>) -> Self {
        Self {
            exec_id: exec_id.into(),
        }
    }
}

impl OperationParams for ExecInfoParams {
    const OPERATION: &'static str = "exec info";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "exec id", &self.exec_id)
    }
}
