//! Image parameters, including the streamed build, pull and push.

use bytes::Bytes;
use camino::Utf8PathBuf;

use super::{OperationParams, qualify, require_items, require_text};
use crate::engine::auth::{AuthConfig, AuthConfigs};
use crate::engine::pump::StreamCanceller;
use crate::error::EngineError;

/// Parameters for inspecting an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectImageParams {
    pub(crate) image: String,
}

impl InspectImageParams {
    /// Inspect the given image name or id.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }
}

impl OperationParams for InspectImageParams {
    const OPERATION: &'static str = "inspect image";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "image", &self.image)
    }
}

/// Parameters for listing images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListImagesParams {
    pub(crate) all: Option<bool>,
}

impl ListImagesParams {
    /// List top-level images.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Include intermediate images.
    #[must_use]
    pub const fn with_all(mut self, all: bool) -> Self {
        self.all = Some(all);
        self
    }
}

impl OperationParams for ListImagesParams {
    const OPERATION: &'static str = "list images";

    fn validate(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Parameters for removing an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveImageParams {
    pub(crate) image: String,
    pub(crate) force: Option<bool>,
    pub(crate) no_prune: Option<bool>,
}

impl RemoveImageParams {
    /// Remove the given image.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            force: None,
            no_prune: None,
        }
    }

    /// Remove even if containers use the image.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }

    /// Keep untagged parent images.
    #[must_use]
    pub const fn with_no_prune(mut self, no_prune: bool) -> Self {
        self.no_prune = Some(no_prune);
        self
    }
}

impl OperationParams for RemoveImageParams {
    const OPERATION: &'static str = "remove image";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "image", &self.image)
    }
}

/// Parameters for tagging an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagImageParams {
    pub(crate) image: String,
    pub(crate) repository: String,
    pub(crate) tag: Option<String>,
    pub(crate) force: Option<bool>,
}

impl TagImageParams {
    /// Add `repository` as a name for `image`.
    #[must_use]
    pub fn new(image: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            repository: repository.into(),
            tag: None,
            force: None,
        }
    }

    /// Use this tag instead of `latest`.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Move the tag even if it already names another image.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }
}

impl OperationParams for TagImageParams {
    const OPERATION: &'static str = "tag image";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "image", &self.image)?;
        require_text(Self::OPERATION, "repository", &self.repository)
    }
}

/// What to send as the build context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildContext {
    /// Files and directories to pack at the root of the context.
    Files(Vec<Utf8PathBuf>),
    /// A ready-made tar archive.
    Archive(Bytes),
}

/// Parameters for building an image.
#[derive(Debug, Clone)]
pub struct BuildImageParams {
    pub(crate) context: BuildContext,
    pub(crate) tag: Option<String>,
    pub(crate) memory: Option<i64>,
    pub(crate) memswap: Option<i64>,
    pub(crate) pull: Option<bool>,
    pub(crate) no_cache: Option<bool>,
    pub(crate) auth_configs: Option<AuthConfigs>,
    pub(crate) canceller: Option<StreamCanceller>,
}

impl BuildImageParams {
    /// Build from the given context.
    #[must_use]
    pub const fn new(context: BuildContext) -> Self {
        Self {
            context,
            tag: None,
            memory: None,
            memswap: None,
            pull: None,
            no_cache: None,
            auth_configs: None,
            canceller: None,
        }
    }

    /// Build from files on disk; each lands at the root of the context.
    #[must_use]
    pub fn from_files<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        Self::new(BuildContext::Files(files.into_iter().map(Into::into).collect()))
    }

    /// Name and tag the resulting image.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Memory limit for build containers, in bytes.
    #[must_use]
    pub const fn with_memory(mut self, memory: i64) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Memory plus swap limit for build containers, in bytes.
    #[must_use]
    pub const fn with_memswap(mut self, memswap: i64) -> Self {
        self.memswap = Some(memswap);
        self
    }

    /// Always pull newer base images.
    #[must_use]
    pub const fn with_pull(mut self, pull: bool) -> Self {
        self.pull = Some(pull);
        self
    }

    /// Ignore the build cache.
    #[must_use]
    pub const fn with_no_cache(mut self, no_cache: bool) -> Self {
        self.no_cache = Some(no_cache);
        self
    }

    /// Registry credentials for base images; overrides the connector's own.
    #[must_use]
    pub fn with_auth_configs(mut self, auth_configs: AuthConfigs) -> Self {
        self.auth_configs = Some(auth_configs);
        self
    }

    /// Allow the build to be cancelled through `canceller`.
    #[must_use]
    pub fn with_canceller(mut self, canceller: StreamCanceller) -> Self {
        self.canceller = Some(canceller);
        self
    }
}

impl OperationParams for BuildImageParams {
    const OPERATION: &'static str = "build image";

    fn validate(&self) -> Result<(), EngineError> {
        match &self.context {
            BuildContext::Files(files) => {
                let names: Vec<String> = files.iter().map(ToString::to_string).collect();
                require_items(Self::OPERATION, "build context", &names)
            }
            BuildContext::Archive(archive) if archive.is_empty() => Err(
                EngineError::invalid_argument(Self::OPERATION, "build context archive is empty"),
            ),
            BuildContext::Archive(_) => Ok(()),
        }
    }
}

/// Parameters for pulling an image.
#[derive(Debug, Clone)]
pub struct PullImageParams {
    pub(crate) image: String,
    pub(crate) tag: Option<String>,
    pub(crate) registry: Option<String>,
    pub(crate) auth_config: Option<AuthConfig>,
    pub(crate) canceller: Option<StreamCanceller>,
}

impl PullImageParams {
    /// Pull the given image name.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            tag: None,
            registry: None,
            auth_config: None,
            canceller: None,
        }
    }

    /// Pull this tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Pull from this registry host.
    #[must_use]
    pub fn with_registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Credentials for the registry; overrides the connector's own.
    #[must_use]
    pub fn with_auth_config(mut self, auth_config: AuthConfig) -> Self {
        self.auth_config = Some(auth_config);
        self
    }

    /// Allow the pull to be cancelled through `canceller`.
    #[must_use]
    pub fn with_canceller(mut self, canceller: StreamCanceller) -> Self {
        self.canceller = Some(canceller);
        self
    }

    pub(crate) fn from_image(&self) -> String {
        qualify(self.registry.as_deref(), &self.image)
    }
}

impl OperationParams for PullImageParams {
    const OPERATION: &'static str = "pull image";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "image", &self.image)
    }
}

/// Parameters for pushing an image.
#[derive(Debug, Clone)]
pub struct PushImageParams {
    pub(crate) repository: String,
    pub(crate) tag: Option<String>,
    pub(crate) registry: Option<String>,
    pub(crate) auth_config: Option<AuthConfig>,
    pub(crate) canceller: Option<StreamCanceller>,
}

impl PushImageParams {
    /// Push the given repository.
    #[must_use]
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: None,
            registry: None,
            auth_config: None,
            canceller: None,
        }
    }

    /// Push only this tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Push to this registry host.
    #[must_use]
    pub fn with_registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Credentials for the registry; overrides the connector's own.
    #[must_use]
    pub fn with_auth_config(mut self, auth_config: AuthConfig) -> Self {
        self.auth_config = Some(auth_config);
        self
    }

    /// Allow the push to be cancelled through `canceller`.
    #[must_use]
    pub fn with_canceller(mut self, canceller: StreamCanceller) -> Self {
        self.canceller = Some(canceller);
        self
    }

    pub(crate) fn qualified_repository(&self) -> String {
        qualify(self.registry.as_deref(), &self.repository)
    }

    /// Status prefix announcing the pushed digest.
    pub(crate) fn digest_marker(&self) -> String {
        format!("{}: digest: ", self.tag.as_deref().unwrap_or("latest"))
    }
}

impl OperationParams for PushImageParams {
    const OPERATION: &'static str = "push image";

    fn validate(&self) -> Result<(), EngineError> {
        require_text(Self::OPERATION, "repository", &self.repository)
    }
}
