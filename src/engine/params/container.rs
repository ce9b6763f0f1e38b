//! Container lifecycle parameters.

use std::time::Duration;

use super::{OperationParams, require_text};
use crate::engine::models::ContainerCreateBody;
use crate::error::EngineError;

macro_rules! container_id_params {
    ($(#[$doc:meta])* $name:ident, $operation:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub(crate) container_id: String,
        }

        impl $name {
            /// Target the given container id or name.
            #[must_use]
            pub fn new(container_id: impl Into<String>) -> Self {
                Self {
                    container_id: container_id.into(),
                }
            }
        }

        impl OperationParams for $name {
            const OPERATION: &'static str = $operation;

            fn validate(&self) -> Result<(), EngineError> {
                require_text(Self::OPERATION, "container id", &self.container_id)
            }
        }
    };
}

container_id_params!(
    /// Parameters for starting a container.
    StartContainerParams,
    "start container"
);

container_id_params!(
    /// Parameters for waiting on a container to exit.
    WaitContainerParams,
    "wait container"
);

/// Parameters for creating a container.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateContainerParams {
    pub(crate) config: ContainerCreateBody,
    pub(crate) name: Option<String>,
}

impl CreateContainerParams {
    /// Create a container from `config`, which must name an image.
    #[must_use]
    pub const fn new(config: ContainerCreateBody) -> Self {
        Self { config, name: None }
    }

    /// Assign a container name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl OperationParams for CreateContainerParams {
    const OPERATION: &'static str = "create container";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(
            Self::OPERATION,
            "image",
            self.config.image.as_deref().unwrap_or_default(),
        )
    }
}

/// Parameters for stopping a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopContainerParams {
    pub(crate) container_id: String,
    pub(crate) timeout: Option<Duration>,
}

impl StopContainerParams {
    /// Stop the given container using the daemon's grace period.
    #[must_use]
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            timeout: None,
        }
    }

    /// Wait this long before killing the container. Sent in whole seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl OperationParams for StopContainerParams {
    const OPERATION: &'static str = "stop container";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "container id", &self.container_id)
    }
}

/// Parameters for sending a signal to a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillContainerParams {
    pub(crate) container_id: String,
    pub(crate) signal: Option<String>,
}

impl KillContainerParams {
    /// Kill the given container with the daemon's default signal.
    #[must_use]
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            signal: None,
        }
    }

    /// Send `signal` (for example `SIGTERM` or `9`) instead.
    #[must_use]
    pub fn with_signal(mut self, signal: impl Into<String>) -> Self {
        self.signal = Some(signal.into());
        self
    }
}

impl OperationParams for KillContainerParams {
    const OPERATION: &'static str = "kill container";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "container id", &self.container_id)
    }
}

/// Parameters for removing a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveContainerParams {
    pub(crate) container_id: String,
    pub(crate) force: Option<bool>,
    pub(crate) remove_volumes: Option<bool>,
}

impl RemoveContainerParams {
    /// Remove the given container.
    #[must_use]
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            force: None,
            remove_volumes: None,
        }
    }

    /// Kill the container first if it is running.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    /// Also remove anonymous volumes.
    #[must_use]
    pub const fn with_remove_volumes(mut self, remove_volumes: bool) -> Self {
        self.remove_volumes = Some(remove_volumes);
        self
    }
}

impl OperationParams for RemoveContainerParams {
    const OPERATION: &'static str = "remove container";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "container id", &self.container_id)
    }
}

/// Parameters for inspecting a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectContainerParams {
    pub(crate) container_id: String,
    pub(crate) size: Option<bool>,
}

impl InspectContainerParams {
    /// Inspect the given container.
    #[must_use]
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            size: None,
        }
    }

    /// Ask the daemon to compute filesystem sizes.
    #[must_use]
    pub const fn with_size(mut self, size: bool) -> Self {
        self.size = Some(size);
        self
    }
}

impl OperationParams for InspectContainerParams {
    const OPERATION: &'static str = "inspect container";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "container id", &self.container_id)
    }
}

/// Parameters for listing containers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListContainersParams {
    pub(crate) all: Option<bool>,
    pub(crate) size: Option<bool>,
}

impl ListContainersParams {
    /// List running containers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Include stopped containers.
    #[must_use]
    pub const fn with_all(mut self, all: bool) -> Self {
        self.all = Some(all);
        self
    }

    /// Report container sizes.
    #[must_use]
    pub const fn with_size(mut self, size: bool) -> Self {
        self.size = Some(size);
        self
    }
}

impl OperationParams for ListContainersParams {
    const OPERATION: &'static str = "list containers";

    fn validate(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Parameters for listing processes inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopContainerParams {
    pub(crate) container_id: String,
    pub(crate) ps_args: Vec<String>,
}

impl TopContainerParams {
    /// List processes with the daemon's default `ps` arguments.
    #[must_use]
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            ps_args: Vec::new(),
        }
    }

    /// Pass these arguments to `ps`.
    #[must_use]
    pub fn with_ps_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ps_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn joined_ps_args(&self) -> Option<String> {
        (!self.ps_args.is_empty()).then(|| self.ps_args.join(" "))
    }
}

impl OperationParams for TopContainerParams {
    const OPERATION: &'static str = "top";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "container id", &self.container_id)
    }
}

/// Parameters for attaching to a container's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachContainerParams {
    pub(crate) container_id: String,
    pub(crate) stream: Option<bool>,
    pub(crate) logs: Option<bool>,
}

impl AttachContainerParams {
    /// Attach to the given container.
    #[must_use]
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            stream: None,
            logs: None,
        }
    }

    /// Keep streaming output as the container produces it.
    #[must_use]
    pub const fn with_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Replay output produced before attaching. Defaults to the `stream` flag.
    #[must_use]
    pub const fn with_logs(mut self, logs: bool) -> Self {
        self.logs = Some(logs);
        self
    }

    pub(crate) fn effective_logs(&self) -> Option<bool> {
        self.logs.or(self.stream)
    }
}

impl OperationParams for AttachContainerParams {
    const OPERATION: &'static str = "attach container";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "container id", &self.container_id)
    }
}

/// Parameters for reading a container's logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerLogsParams {
    pub(crate) container_id: String,
    pub(crate) stdout: bool,
    pub(crate) stderr: bool,
    pub(crate) follow: Option<bool>,
    pub(crate) timestamps: Option<bool>,
    pub(crate) tail: Option<String>,
}

impl ContainerLogsParams {
    /// Read both output streams of the given container.
    #[must_use]
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            stdout: true,
            stderr: true,
            follow: None,
            timestamps: None,
            tail: None,
        }
    }

    /// Choose which output streams to read.
    #[must_use]
    pub const fn with_streams(mut self, stdout: bool, stderr: bool) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    /// Keep the stream open for new output.
    #[must_use]
    pub const fn with_follow(mut self, follow: bool) -> Self {
        self.follow = Some(follow);
        self
    }

    /// Prefix each line with its timestamp.
    #[must_use]
    pub const fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    /// Only return this many trailing lines (`all` for everything).
    #[must_use]
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }
}

impl OperationParams for ContainerLogsParams {
    const OPERATION: &'static str = "container logs";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "container id", &self.container_id)?;
        if !self.stdout && !self.stderr {
            return Err(EngineError::invalid_argument(
                Self::OPERATION,
                "at least one of stdout or stderr must be selected",
            ));
        }
        Ok(())
    }
}

/// Parameters for committing a container to an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitContainerParams {
    pub(crate) container_id: String,
    pub(crate) repository: Option<String>,
    pub(crate) tag: Option<String>,
    pub(crate) comment: Option<String>,
    pub(crate) author: Option<String>,
}

impl CommitContainerParams {
    /// Commit the given container.
    #[must_use]
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            repository: None,
            tag: None,
            comment: None,
            author: None,
        }
    }

    /// Name the new image.
    #[must_use]
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Tag the new image.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Record a commit message.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Record the image author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

impl OperationParams for CommitContainerParams {
    const OPERATION: &'static str = "commit";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "container id", &self.container_id)
    }
}
