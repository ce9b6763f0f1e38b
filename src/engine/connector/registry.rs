//! Pulling and pushing images.

use hyper::Method;

use super::{DockerConnector, image_segment};
use super::classify::{Accept, expect_status};
use super::progress::{digest_after, watch_progress};
use crate::engine::auth::{AuthConfig, REGISTRY_AUTH_HEADER};
use crate::engine::models::ProgressMessage;
use crate::engine::params::{OperationParams, PullImageParams, PushImageParams};
use crate::engine::pump::{Completion, MessageSink};
use crate::error::EngineError;

impl DockerConnector {
    /// Pull an image (`POST /images/create`), blocking until the pull ends.
    ///
    /// Progress records are delivered to `sink`. Credentials come from the
    /// parameters, falling back to the connector's entry for the registry;
    /// with neither, the pull is anonymous.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank image name,
    /// `EngineError::Daemon` if the daemon rejects the pull or reports a
    /// failure mid-stream, or a transport error.
    pub async fn pull_image<S>(
        &self,
        params: &PullImageParams,
        sink: S,
    ) -> Result<Completion<()>, EngineError>
    where
        S: MessageSink<ProgressMessage>,
    {
        let canceller = params.canceller.clone().unwrap_or_default();
        let credentials = params
            .auth_config
            .as_ref()
            .or_else(|| self.auth_configs().for_registry(params.registry.as_deref()))
            .map(AuthConfig::to_header_value)
            .transpose()?;

        let mut builder = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path("/images/create"))
            .query("fromImage", params.from_image())
            .query_if_set("tag", params.tag.as_ref());
        if let Some(value) = credentials {
            builder = builder.header(REGISTRY_AUTH_HEADER, value);
        }
        let response = builder.request().await?;
        let accepted =
            expect_status(response, PullImageParams::OPERATION, Accept::Only(&[200])).await?;

        let outcome = watch_progress(accepted, sink, |_: &ProgressMessage| None, &canceller).await?;
        Ok(match outcome {
            Completion::Cancelled => Completion::Cancelled,
            Completion::Finished(_) => Completion::Finished(()),
        })
    }

    /// Push an image (`POST /images/{name}/push`) and return its digest.
    ///
    /// The daemon requires an `X-Registry-Auth` header on every push, so an
    /// empty credential set is sent when none is configured.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank repository,
    /// `EngineError::Daemon` if the daemon rejects the push or reports a
    /// failure mid-stream, `EngineError::MissingResult` if no digest is
    /// announced, or a transport error.
    pub async fn push_image<S>(
        &self,
        params: &PushImageParams,
        sink: S,
    ) -> Result<Completion<String>, EngineError>
    where
        S: MessageSink<ProgressMessage>,
    {
        let canceller = params.canceller.clone().unwrap_or_default();
        let credentials = params
            .auth_config
            .as_ref()
            .or_else(|| self.auth_configs().for_registry(params.registry.as_deref()))
            .map_or_else(
                || AuthConfig::default().to_header_value(),
                AuthConfig::to_header_value,
            )?;

        let response = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path(&format!(
                "/images/{}/push",
                image_segment(&params.qualified_repository())
            )))
            .query_if_set("tag", params.tag.as_ref())
            .header(REGISTRY_AUTH_HEADER, credentials)
            .request()
            .await?;
        let accepted =
            expect_status(response, PushImageParams::OPERATION, Accept::Only(&[200])).await?;

        let marker = params.digest_marker();
        let extract = move |message: &ProgressMessage| digest_after(message, &marker);
        match watch_progress(accepted, sink, extract, &canceller).await? {
            Completion::Cancelled => Ok(Completion::Cancelled),
            Completion::Finished(Some(digest)) => Ok(Completion::Finished(digest)),
            Completion::Finished(None) => Err(EngineError::MissingResult {
                operation: PushImageParams::OPERATION,
                message: String::from("the push finished without reporting a digest"),
            }),
        }
    }
}
