//! Image builds.

use bytes::Bytes;
use hyper::Method;

use super::classify::{Accept, expect_status};
use super::progress::{built_image_id, watch_progress};
use super::{DockerConnector, TAR_CONTENT_TYPE, with_entity};
use crate::engine::archive::build_context_archive;
use crate::engine::auth::REGISTRY_CONFIG_HEADER;
use crate::engine::models::ProgressMessage;
use crate::engine::params::{BuildContext, BuildImageParams, OperationParams};
use crate::engine::pump::{Completion, MessageSink};
use crate::error::EngineError;

impl DockerConnector {
    /// Build an image (`POST /build`) and return its id.
    ///
    /// Every progress record is delivered to `sink` while the build runs.
    /// Intermediate containers are always removed. Registry credentials come
    /// from the parameters, falling back to the connector's.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for an empty or unreadable
    /// build context, `EngineError::Daemon` if the daemon rejects the build
    /// or a build step fails, `EngineError::MissingResult` if the stream ends
    /// without announcing an image id, or a transport error.
    pub async fn build_image<S>(
        &self,
        params: &BuildImageParams,
        sink: S,
    ) -> Result<Completion<String>, EngineError>
    where
        S: MessageSink<ProgressMessage>,
    {
        params.validate()?;
        let canceller = params.canceller.clone().unwrap_or_default();
        if canceller.is_cancelled() {
            return Ok(Completion::Cancelled);
        }

        let archive = match &params.context {
            BuildContext::Files(files) => Bytes::from(build_context_archive(files)?),
            BuildContext::Archive(bytes) => bytes.clone(),
        };
        let credentials = params.auth_configs.as_ref().unwrap_or(self.auth_configs());
        let registry_config = if credentials.is_empty() {
            None
        } else {
            Some(credentials.to_header_value()?)
        };

        let mut builder = self
            .open()
            .method(Method::POST)
            .path(&self.path("/build"))
            .query("rm", true)
            .query("forcerm", true)
            .query_if_set("t", params.tag.as_ref())
            .query_if_set("memory", params.memory)
            .query_if_set("memswap", params.memswap)
            .query_if_set("pull", params.pull)
            .query_if_set("nocache", params.no_cache);
        if let Some(value) = registry_config {
            builder = builder.header(REGISTRY_CONFIG_HEADER, value);
        }
        tracing::debug!(bytes = archive.len(), tag = ?params.tag, "sending build context");
        let response = with_entity(builder, TAR_CONTENT_TYPE, archive)
            .request()
            .await?;
        let accepted =
            expect_status(response, BuildImageParams::OPERATION, Accept::Only(&[200])).await?;

        match watch_progress(accepted, sink, built_image_id, &canceller).await? {
            Completion::Cancelled => Ok(Completion::Cancelled),
            Completion::Finished(Some(id)) => Ok(Completion::Finished(id)),
            Completion::Finished(None) => Err(EngineError::MissingResult {
                operation: BuildImageParams::OPERATION,
                message: String::from("the build finished without reporting an image id"),
            }),
        }
    }
}
