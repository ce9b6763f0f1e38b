//! Shared handling of build, pull and push progress streams.
//!
//! These operations block until the stream ends. Each record is forwarded to
//! the caller's sink; an extractor may pull a result value (image id,
//! digest) out of the records, and the first one found wins. A record with
//! an `error` field ends the stream and fails the operation.

use std::ops::ControlFlow;

use crate::engine::models::ProgressMessage;
use crate::engine::pump::{
    Completion, Consumer, JsonMessageReader, MessageSink, PumpOutcome, StreamCanceller,
    await_pump, spawn_pump,
};
use crate::engine::transport::DockerResponse;
use crate::error::EngineError;

/// Status reported for failures carried inside a progress stream.
const STREAM_FAILURE_STATUS: u16 = 500;

struct ProgressWatch<S, F> {
    sink: S,
    extract: F,
    result: Option<String>,
    failure: Option<String>,
}

impl<S, F> Consumer<ProgressMessage> for ProgressWatch<S, F>
where
    S: MessageSink<ProgressMessage>,
    F: FnMut(&ProgressMessage) -> Option<String> + Send + 'static,
{
    fn consume(&mut self, message: ProgressMessage) -> ControlFlow<()> {
        if self.result.is_none() {
            self.result = (self.extract)(&message);
        }
        let failure = message.failure().map(str::to_owned);
        self.sink.process(message);
        match failure {
            Some(text) => {
                self.failure = Some(text);
                ControlFlow::Break(())
            }
            None => ControlFlow::Continue(()),
        }
    }
}

/// Pump a progress stream to completion.
///
/// Returns the extracted value, `None` if nothing matched, or
/// [`Completion::Cancelled`] if `canceller` fired.
pub(super) async fn watch_progress<S, F>(
    response: DockerResponse,
    sink: S,
    extract: F,
    canceller: &StreamCanceller,
) -> Result<Completion<Option<String>>, EngineError>
where
    S: MessageSink<ProgressMessage>,
    F: FnMut(&ProgressMessage) -> Option<String> + Send + 'static,
{
    let watch = ProgressWatch {
        sink,
        extract,
        result: None,
        failure: None,
    };
    let receiver = spawn_pump(
        response.into_body(),
        JsonMessageReader::<ProgressMessage>::new(),
        watch,
        canceller,
        |result| result,
    );
    let report = await_pump(receiver).await??;
    if report.outcome == PumpOutcome::Cancelled {
        return Ok(Completion::Cancelled);
    }
    match report.consumer.failure {
        Some(text) => Err(EngineError::daemon(STREAM_FAILURE_STATUS, text)),
        None => Ok(Completion::Finished(report.consumer.result)),
    }
}

/// Image id announced by a classic builder `stream` line or a `aux.ID` record.
pub(super) fn built_image_id(message: &ProgressMessage) -> Option<String> {
    let from_stream = message.stream.as_deref().and_then(|text| {
        text.split_once("Successfully built ")
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .map(str::to_owned)
    });
    from_stream.or_else(|| {
        message
            .aux
            .as_ref()
            .and_then(|aux| aux.get("ID"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
    })
}

/// Digest following `marker` in a push status line.
pub(super) fn digest_after(message: &ProgressMessage, marker: &str) -> Option<String> {
    message
        .status
        .as_deref()
        .and_then(|status| status.split_once(marker))
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .map(str::to_owned)
}
