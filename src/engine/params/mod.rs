//! Parameter objects for engine operations.
//!
//! Each operation takes one parameter value. Required fields are passed to
//! `new`, optional ones are set with chained `with_*` calls and stay unset
//! (and therefore off the wire) otherwise. Parameter values perform no I/O;
//! the connector validates them before it opens a connection.

mod container;
mod events;
mod exec;
mod image;
mod resource;


pub use container::{
    AttachContainerParams, CommitContainerParams, ContainerLogsParams, CreateContainerParams,
    InspectContainerParams, KillContainerParams, ListContainersParams, RemoveContainerParams,
    StartContainerParams, StopContainerParams, TopContainerParams, WaitContainerParams,
};
pub use events::EventsParams;
pub use exec::{CreateExecParams, ExecInfoParams, StartExecParams};
pub use image::{
    BuildContext, BuildImageParams, InspectImageParams, ListImagesParams, PullImageParams,
    PushImageParams, RemoveImageParams, TagImageParams,
};
pub use resource::{GetResourceParams, PutResourceParams};

use crate::error::EngineError;

/// Validation shared by every parameter object.
pub(crate) trait OperationParams {
    /// Operation name used in validation errors.
    const OPERATION: &'static str;

    /// Reject missing or blank required fields.
    fn validate(&self) -> Result<(), EngineError>;
}

/// Fail when a required text field is empty or only whitespace.
pub(crate) fn require_text(
    operation: &'static str,
    field: &str,
    value: &str,
) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        return Err(EngineError::invalid_argument(
            operation,
            format!("{field} is required"),
        ));
    }
    Ok(())
}

/// Fail when a required list is empty or holds only blank entries.
pub(crate) fn require_items(
    operation: &'static str,
    field: &str,
    values: &[String],
) -> Result<(), EngineError> {
    if values.iter().all(|value| value.trim().is_empty()) {
        return Err(EngineError::invalid_argument(
            operation,
            format!("{field} must contain at least one entry"),
        ));
    }
    Ok(())
}

/// Prefix `name` with `registry/` when a registry is set.
pub(crate) fn qualify(registry: Option<&str>, name: &str) -> String {
    registry
        .filter(|host| !host.is_empty())
        .map_or_else(|| String::from(name), |host| format!("{host}/{name}"))
}
