//! Copying files into and out of containers as tar archives.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use hyper::Method;

use super::classify::{Accept, expect_status};
use super::{DockerConnector, TAR_CONTENT_TYPE, segment, with_entity};
use crate::engine::params::{GetResourceParams, OperationParams, PutResourceParams};
use crate::engine::transport::BodyStream;
use crate::error::EngineError;

/// A tar archive streamed out of a container.
///
/// The connection stays open until the archive has been read or the stream
/// is dropped.
#[derive(Debug)]
pub struct ArchiveStream(BodyStream);

impl ArchiveStream {
    /// Read the next chunk of the archive. `None` marks the end.
    pub async fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
        self.0.next_chunk().await
    }

    /// Read the rest of the archive into memory.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Transport` if reading fails.
    pub async fn bytes(self) -> Result<Bytes, EngineError> {
        self.0.read_to_end().await
    }

    /// Stop reading and close the connection.
    pub fn close(self) {
        self.0.close();
    }
}

impl Stream for ArchiveStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.0).poll_next(cx)
    }
}

impl DockerConnector {
    /// Fetch a file or directory from a container as a tar archive
    /// (`GET /containers/{id}/archive`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id or path,
    /// `EngineError::Daemon` for a non-200 status, or a transport error.
    pub async fn get_resource(
        &self,
        params: &GetResourceParams,
    ) -> Result<ArchiveStream, EngineError> {
        let response = self
            .prepare(params)?
            .path(&self.path(&format!("/containers/{}/archive", segment(&params.container_id))))
            .query("path", &params.path)
            .request()
            .await?;
        let accepted =
            expect_status(response, GetResourceParams::OPERATION, Accept::Only(&[200])).await?;
        Ok(ArchiveStream(accepted.into_body()))
    }

    /// Extract a tar archive into a directory of a container
    /// (`PUT /containers/{id}/archive`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for a blank id or path,
    /// `EngineError::Daemon` for a non-200 status, or a transport error.
    pub async fn put_resource(&self, params: &PutResourceParams) -> Result<(), EngineError> {
        let builder = self
            .prepare(params)?
            .method(Method::PUT)
            .path(&self.path(&format!("/containers/{}/archive", segment(&params.container_id))))
            .query("path", &params.path)
            .query_if_set("noOverwriteDirNonDir", params.no_overwrite_dir_non_dir);
        let response = with_entity(builder, TAR_CONTENT_TYPE, params.archive.clone())
            .request()
            .await?;
        expect_status(response, PutResourceParams::OPERATION, Accept::Only(&[200])).await?;
        Ok(())
    }
}
