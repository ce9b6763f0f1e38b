//! Container lifecycle operations.

use hyper::Method;

use super::classify::{Accept, daemon_error, expect_status};
use super::{DockerConnector, JSON_CONTENT_TYPE, segment, with_entity, without_entity};
use crate::engine::models::{
    ContainerCommitted, ContainerCreated, ContainerExitStatus, ContainerInspectResponse,
    ContainerStarted, ContainerStopped, ContainerSummary, ContainerTopResponse,
};
use crate::engine::params::{
    AttachContainerParams, CommitContainerParams, ContainerLogsParams, CreateContainerParams,
    InspectContainerParams, KillContainerParams, ListContainersParams, OperationParams,
    RemoveContainerParams, StartContainerParams, StopContainerParams, TopContainerParams,
    WaitContainerParams,
};
use crate::engine::pump::{LogMessage, LogMessageReader, MessageSink, StreamHandle, spawn_stream};
use crate::error::EngineError;

impl DockerConnector {
    /// Create a container (`POST /containers/create`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` if the config names no image,
    /// `EngineError::Daemon` for a non-201 status, a transport error if the
    /// daemon cannot be reached, or `EngineError::Parse` for an unexpected
    /// body.
    pub async fn create_container(
        &self,
        params: &CreateContainerParams,
    ) -> Result<ContainerCreated, EngineError> {
        let body = serde_json::to_vec(&params.config).map_err(|e| EngineError::Parse {
            message: e.to_string(),
        })?;
        let builder = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path("/containers/create"))
            .query_if_set("name", params.name.as_ref());
        let response = with_entity(builder, JSON_CONTENT_TYPE, body)
            .request()
            .await?;
        expect_status(
            response,
            CreateContainerParams::OPERATION,
            Accept::Only(&[201]),
        )
        .await?
        .wire_json()
        .await
    }

    /// Start a container (`POST /containers/{id}/start`).
    ///
    /// 204 means started and 304 means it was already running. Some daemons
    /// answer 200 with a warning instead of 204; that is logged and reported
    /// as [`ContainerStarted::StartedWithWarning`] rather than failing.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id,
    /// `EngineError::Daemon` for any other status, or a transport error.
    pub async fn start_container(
        &self,
        params: &StartContainerParams,
    ) -> Result<ContainerStarted, EngineError> {
        let builder = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path(&format!("/containers/{}/start", segment(&params.container_id))));
        let response = with_entity(builder, JSON_CONTENT_TYPE, Vec::new())
            .request()
            .await?;
        match response.status() {
            204 => Ok(ContainerStarted::Started),
            304 => Ok(ContainerStarted::AlreadyRunning),
            200 => {
                let warning = response.text().await?;
                tracing::warn!(
                    container = %params.container_id,
                    warning = %warning.trim(),
                    "daemon reported a warning while starting container"
                );
                Ok(ContainerStarted::StartedWithWarning(warning))
            }
            _ => Err(daemon_error(response, StartContainerParams::OPERATION).await),
        }
    }

    /// Stop a container (`POST /containers/{id}/stop`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id,
    /// `EngineError::Daemon` for a status other than 204 or 304, or a
    /// transport error.
    pub async fn stop_container(
        &self,
        params: &StopContainerParams,
    ) -> Result<ContainerStopped, EngineError> {
        let builder = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path(&format!("/containers/{}/stop", segment(&params.container_id))))
            .query_if_set("t", params.timeout.map(|timeout| timeout.as_secs()));
        let response = without_entity(builder).request().await?;
        match response.status() {
            204 => Ok(ContainerStopped::Stopped),
            304 => Ok(ContainerStopped::AlreadyStopped),
            _ => Err(daemon_error(response, StopContainerParams::OPERATION).await),
        }
    }

    /// Send a signal to a container (`POST /containers/{id}/kill`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id,
    /// `EngineError::Daemon` for a non-204 status, or a transport error.
    pub async fn kill_container(&self, params: &KillContainerParams) -> Result<(), EngineError> {
        let builder = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path(&format!("/containers/{}/kill", segment(&params.container_id))))
            .query_if_set("signal", params.signal.as_ref());
        let response = without_entity(builder).request().await?;
        expect_status(response, KillContainerParams::OPERATION, Accept::Only(&[204])).await?;
        Ok(())
    }

    /// Remove a container (`DELETE /containers/{id}`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id,
    /// `EngineError::Daemon` for a non-204 status, or a transport error.
    pub async fn remove_container(
        &self,
        params: &RemoveContainerParams,
    ) -> Result<(), EngineError> {
        let response = self
            .prepare(params)?
            .method(Method::DELETE)
            .path(&self.path(&format!("/containers/{}", segment(&params.container_id))))
            .query_if_set("force", params.force)
            .query_if_set("v", params.remove_volumes)
            .request()
            .await?;
        expect_status(
            response,
            RemoveContainerParams::OPERATION,
            Accept::Only(&[204]),
        )
        .await?;
        Ok(())
    }

    /// Block until a container exits (`POST /containers/{id}/wait`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id,
    /// `EngineError::Daemon` for a non-200 status, a transport error, or
    /// `EngineError::Parse` for an unexpected body.
    pub async fn wait_container(
        &self,
        params: &WaitContainerParams,
    ) -> Result<ContainerExitStatus, EngineError> {
        let builder = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path(&format!("/containers/{}/wait", segment(&params.container_id))));
        let response = without_entity(builder).request().await?;
        expect_status(response, WaitContainerParams::OPERATION, Accept::Only(&[200]))
            .await?
            .wire_json()
            .await
    }

    /// Inspect a container (`GET /containers/{id}/json`).
    ///
    /// # Errors
    ///
    /// As for [`Self::wait_container`].
    pub async fn inspect_container(
        &self,
        params: &InspectContainerParams,
    ) -> Result<ContainerInspectResponse, EngineError> {
        let response = self
            .prepare(params)?
            .path(&self.path(&format!("/containers/{}/json", segment(&params.container_id))))
            .query_if_set("size", params.size)
            .request()
            .await?;
        expect_status(
            response,
            InspectContainerParams::OPERATION,
            Accept::Only(&[200]),
        )
        .await?
        .json()
        .await
    }

    /// List containers (`GET /containers/json`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Daemon` for a non-200 status, a transport error,
    /// or `EngineError::Parse` for an unexpected body.
    pub async fn list_containers(
        &self,
        params: &ListContainersParams,
    ) -> Result<Vec<ContainerSummary>, EngineError> {
        let response = self
            .prepare(params)?
            .path(&self.path("/containers/json"))
            .query_if_set("all", params.all)
            .query_if_set("size", params.size)
            .request()
            .await?;
        expect_status(
            response,
            ListContainersParams::OPERATION,
            Accept::Only(&[200]),
        )
        .await?
        .json()
        .await
    }

    /// List the processes running in a container (`GET /containers/{id}/top`).
    ///
    /// # Errors
    ///
    /// As for [`Self::wait_container`].
    pub async fn top_container(
        &self,
        params: &TopContainerParams,
    ) -> Result<ContainerTopResponse, EngineError> {
        let response = self
            .prepare(params)?
            .path(&self.path(&format!("/containers/{}/top", segment(&params.container_id))))
            .query_if_set("ps_args", params.joined_ps_args())
            .request()
            .await?;
        expect_status(response, TopContainerParams::OPERATION, Accept::Only(&[200]))
            .await?
            .json()
            .await
    }

    /// Attach to a container's output (`POST /containers/{id}/attach`).
    ///
    /// Returns once the daemon accepts the attach; output lines are delivered
    /// to `sink` on a background task until the stream ends or the returned
    /// handle is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id,
    /// `EngineError::Daemon` for a non-200 status, or a transport error.
    pub async fn attach_container<S>(
        &self,
        params: &AttachContainerParams,
        sink: S,
    ) -> Result<StreamHandle, EngineError>
    where
        S: MessageSink<LogMessage>,
    {
        let response = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path(&format!("/containers/{}/attach", segment(&params.container_id))))
            .query("stdout", true)
            .query("stderr", true)
            .query_if_set("stream", params.stream)
            .query_if_set("logs", params.effective_logs())
            .request()
            .await?;
        let accepted = expect_status(
            response,
            AttachContainerParams::OPERATION,
            Accept::Only(&[200]),
        )
        .await?;
        Ok(spawn_stream(
            accepted.into_body(),
            LogMessageReader::new(),
            sink,
        ))
    }

    /// Read a container's logs (`GET /containers/{id}/logs`).
    ///
    /// Lines are delivered to `sink` on a background task. With `follow`
    /// set, the stream stays open until the container stops or the returned
    /// handle is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id or when neither
    /// stream is selected, `EngineError::Daemon` for a non-200 status, or a
    /// transport error.
    pub async fn container_logs<S>(
        &self,
        params: &ContainerLogsParams,
        sink: S,
    ) -> Result<StreamHandle, EngineError>
    where
        S: MessageSink<LogMessage>,
    {
        let response = self
            .prepare(params)?
            .path(&self.path(&format!("/containers/{}/logs", segment(&params.container_id))))
            .query("stdout", params.stdout)
            .query("stderr", params.stderr)
            .query_if_set("follow", params.follow)
            .query_if_set("timestamps", params.timestamps)
            .query_if_set("tail", params.tail.as_ref())
            .request()
            .await?;
        let accepted = expect_status(
            response,
            ContainerLogsParams::OPERATION,
            Accept::Only(&[200]),
        )
        .await?;
        Ok(spawn_stream(
            accepted.into_body(),
            LogMessageReader::new(),
            sink,
        ))
    }

    /// Create an image from a container (`POST /commit`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id,
    /// `EngineError::Daemon` for a non-201 status, a transport error, or
    /// `EngineError::Parse` for an unexpected body.
    pub async fn commit_container(
        &self,
        params: &CommitContainerParams,
    ) -> Result<ContainerCommitted, EngineError> {
        let builder = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path("/commit"))
            .query("container", &params.container_id)
            .query_if_set("repo", params.repository.as_ref())
            .query_if_set("tag", params.tag.as_ref())
            .query_if_set("comment", params.comment.as_ref())
            .query_if_set("author", params.author.as_ref());
        let response = with_entity(builder, JSON_CONTENT_TYPE, &b"{}"[..])
            .request()
            .await?;
        expect_status(
            response,
            CommitContainerParams::OPERATION,
            Accept::Only(&[201]),
        )
        .await?
        .wire_json()
        .await
    }
}
