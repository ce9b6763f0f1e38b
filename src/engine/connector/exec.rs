//! Running commands inside containers.

use hyper::Method;

use super::classify::{Accept, expect_status};
use super::{DockerConnector, JSON_CONTENT_TYPE, segment, with_entity};
use crate::engine::models::{Exec, ExecConfig, ExecInspectResponse, ExecStartConfig, IdResponse};
use crate::engine::naming;
use crate::engine::params::{CreateExecParams, ExecInfoParams, OperationParams, StartExecParams};
use crate::engine::pump::{BoxSink, LogMessage, LogMessageReader, StreamHandle, spawn_stream, unbox_sink};
use crate::error::EngineError;

impl DockerConnector {
    /// Create an exec session (`POST /containers/{id}/exec`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id or empty
    /// command, `EngineError::Daemon` for a non-2xx status, a transport
    /// error, or `EngineError::Parse` for an unexpected body.
    pub async fn create_exec(&self, params: &CreateExecParams) -> Result<Exec, EngineError> {
        let config = ExecConfig {
            cmd: params.command.clone(),
            attach_stdout: params.attach_stdout,
            attach_stderr: params.attach_stderr,
            tty: params.tty,
        };
        let body = naming::encode(&config)?;
        let builder = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path(&format!("/containers/{}/exec", segment(&params.container_id))));
        let response = with_entity(builder, JSON_CONTENT_TYPE, body)
            .request()
            .await?;
        let created: IdResponse =
            expect_status(response, CreateExecParams::OPERATION, Accept::AnySuccess)
                .await?
                .wire_json()
                .await?;
        tracing::debug!(exec = %created.id, container = %params.container_id, "exec created");
        Ok(Exec {
            id: created.id,
            command: params.command.clone(),
        })
    }

    /// Start an exec session (`POST /exec/{id}/start`).
    ///
    /// The exec runs detached when `detach` is set or no sink is given; the
    /// call then returns `None` once the daemon accepts it. Otherwise the
    /// output is pumped to `sink` and the returned handle tracks the stream.
    /// A terminal exec produces raw output, which is delivered as
    /// [`LogKind::Raw`](crate::engine::pump::LogKind::Raw) lines.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id,
    /// `EngineError::Daemon` for a non-2xx status, or a transport error.
    pub async fn start_exec(
        &self,
        params: &StartExecParams,
        sink: Option<BoxSink<LogMessage>>,
    ) -> Result<Option<StreamHandle>, EngineError> {
        let detach = params.detach == Some(true) || sink.is_none();
        let tty = params.tty.unwrap_or(false);
        let body = naming::encode(&ExecStartConfig { detach, tty })?;
        let builder = self
            .prepare(params)?
            .method(Method::POST)
            .path(&self.path(&format!("/exec/{}/start", segment(&params.exec_id))));
        let response = with_entity(builder, JSON_CONTENT_TYPE, body)
            .request()
            .await?;
        let accepted =
            expect_status(response, StartExecParams::OPERATION, Accept::AnySuccess).await?;

        let Some(output) = sink.filter(|_| !detach && accepted.status() != 204) else {
            accepted.into_body().close();
            return Ok(None);
        };
        let reader = if tty {
            LogMessageReader::raw()
        } else {
            LogMessageReader::new()
        };
        Ok(Some(spawn_stream(
            accepted.into_body(),
            reader,
            unbox_sink(output),
        )))
    }

    /// Inspect an exec session (`GET /exec/{id}/json`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id,
    /// `EngineError::Daemon` for a non-200 status, a transport error, or
    /// `EngineError::Parse` for an unexpected body.
    pub async fn exec_info(
        &self,
        params: &ExecInfoParams,
    ) -> Result<ExecInspectResponse, EngineError> {
        let response = self
            .prepare(params)?
            .path(&self.path(&format!("/exec/{}/json", segment(&params.exec_id))))
            .request()
            .await?;
        expect_status(response, ExecInfoParams::OPERATION, Accept::Only(&[200]))
            .await?
            .json()
            .await
    }
}
