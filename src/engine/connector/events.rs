//! The daemon event feed.

use super::DockerConnector;
use super::classify::{Accept, expect_status};
use crate::engine::models::EventMessage;
use crate::engine::params::{EventsParams, OperationParams};
use crate::engine::pump::{JsonMessageReader, MessageSink, StreamHandle, spawn_stream};
use crate::error::EngineError;

impl DockerConnector {
    /// Subscribe to daemon events (`GET /events`).
    ///
    /// Events are delivered to `sink` on a background task. Without `until`
    /// the feed never ends on its own; cancel the returned handle to stop it.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` if `until` precedes `since`,
    /// `EngineError::Daemon` for a non-200 status, or a transport error.
    pub async fn events<S>(&self, params: &EventsParams, sink: S) -> Result<StreamHandle, EngineError>
    where
        S: MessageSink<EventMessage>,
    {
        let filters = params.encoded_filters()?;
        let response = self
            .prepare(params)?
            .path(&self.path("/events"))
            .query_if_set("since", params.since)
            .query_if_set("until", params.until)
            .query_if_set("filters", filters)
            .request()
            .await?;
        let accepted =
            expect_status(response, EventsParams::OPERATION, Accept::Only(&[200])).await?;
        Ok(spawn_stream(
            accepted.into_body(),
            JsonMessageReader::<EventMessage>::new(),
            sink,
        ))
    }
}
