//! Typed daemon payloads.
//!
//! Large response documents (system info, image and container inspection,
//! events) reuse the generated `bollard` models, which already carry the
//! daemon's field spelling. The small request and response bodies owned by
//! this crate use snake case fields and cross the wire through
//! [`crate::engine::naming`].

use serde::{Deserialize, Serialize};

pub use bollard::models::{
    ContainerCreateBody, ContainerInspectResponse, ContainerSummary, ContainerTopResponse,
    EventMessage, ExecInspectResponse, ImageDeleteResponseItem, ImageInspect, ImageSummary,
    SystemInfo, SystemVersion,
};

/// Response to a container create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCreated {
    /// The new container's id.
    pub id: String,
    /// Warnings raised while creating the container.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Outcome of a start request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStarted {
    /// The container was started.
    Started,
    /// The container was already running.
    AlreadyRunning,
    /// The daemon answered 200 with a warning body instead of 204.
    StartedWithWarning(String),
}

/// Outcome of a stop request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStopped {
    /// The container was stopped.
    Stopped,
    /// The container was not running.
    AlreadyStopped,
}

/// Exit status returned by the wait endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerExitStatus {
    /// The container's exit code.
    pub status_code: i64,
}

/// Response to a commit request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerCommitted {
    /// The id of the image created from the container.
    pub id: String,
}

/// Body of an exec create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Command and arguments to run.
    pub cmd: Vec<String>,
    /// Attach to the command's standard output.
    pub attach_stdout: bool,
    /// Attach to the command's standard error.
    pub attach_stderr: bool,
    /// Allocate a pseudo terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tty: Option<bool>,
}

/// Body of an exec start request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecStartConfig {
    /// Return immediately instead of streaming output.
    pub detach: bool,
    /// Whether the exec was created with a terminal.
    pub tty: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct IdResponse {
    pub(crate) id: String,
}

/// A created exec session.
///
/// The id is the only handle tying the create and start calls together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exec {
    /// Daemon-assigned exec id.
    pub id: String,
    /// The command the exec was created with.
    pub command: Vec<String>,
}

/// Byte counters attached to a progress message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDetail {
    /// Bytes processed so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<i64>,
    /// Total bytes expected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

/// Structured error attached to a progress message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Optional numeric code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Error text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One record of a build, pull or push progress stream.
///
/// These streams use lower case field names on the wire, unlike the rest of
/// the API, so the fields are mapped explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressMessage {
    /// Layer or image the record refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Status line, such as `Downloading` or `latest: digest: ...`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Build output text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    /// Rendered progress bar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    /// Byte counters.
    #[serde(
        default,
        rename = "progressDetail",
        skip_serializing_if = "Option::is_none"
    )]
    pub progress_detail: Option<ProgressDetail>,
    /// Error text; present when the operation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured form of `error`.
    #[serde(default, rename = "errorDetail", skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<ErrorDetail>,
    /// Auxiliary payload, such as the built image id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aux: Option<serde_json::Value>,
}

impl ProgressMessage {
    /// The failure text carried by this record, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.error.as_deref().or_else(|| {
            self.error_detail
                .as_ref()
                .and_then(|detail| detail.message.as_deref())
        })
    }
}
