//! Container filesystem archive parameters.

use bytes::Bytes;

use super::{OperationParams, require_text};
use crate::error::EngineError;

/// Parameters for downloading a path from a container as a tar archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResourceParams {
    pub(crate) container_id: String,
    pub(crate) path: String,
}

impl GetResourceParams {
    /// Fetch `path` from the given container.
    #[must_use]
    pub fn new(container_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            path: path.into(),
        }
    }
}

impl OperationParams for GetResourceParams {
    const OPERATION: &'static str = "get resource";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "container id", &self.container_id)?;
        require_text(Self::OPERATION, "path", &self.path)
    }
}

/// Parameters for extracting a tar archive into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResourceParams {
    pub(crate) container_id: String,
    pub(crate) path: String,
    pub(crate) archive: Bytes,
    pub(crate) no_overwrite_dir_non_dir: Option<bool>,
}

impl PutResourceParams {
    /// Extract `archive` under `path` in the given container.
    #[must_use]
    pub fn new(
        container_id: impl Into<String>,
        path: impl Into<String>,
        archive: impl Into<Bytes>,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            path: path.into(),
            archive: archive.into(),
            no_overwrite_dir_non_dir: None,
        }
    }

    /// Refuse to replace a directory with a file or the other way round.
    #[must_use]
    pub const fn with_no_overwrite_dir_non_dir(mut self, refuse: bool) -> Self {
        self.no_overwrite_dir_non_dir = Some(refuse);
        self
    }
}

impl OperationParams for PutResourceParams {
    const OPERATION: &'static str = "put resource";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "container id", &self.container_id)?;
        require_text(Self::OPERATION, "path", &self.path)
    }
}
