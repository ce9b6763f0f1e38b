//! Background pumping of streamed response bodies.
//!
//! Streaming operations hand their still-open response body to a pump task
//! spawned on the ambient tokio runtime. The task decodes one message at a
//! time and hands each to the caller's sink in arrival order, until the body
//! ends, fails, or the caller cancels.
//!
//! Cancellation closes the connection out of band. [`StreamCanceller`] sets
//! its flag immediately before closing, and the pump reports
//! [`PumpOutcome::Cancelled`] for any end of stream or read error observed
//! once the flag is set.

mod json_reader;
mod log_reader;


use std::fmt;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};

use super::transport::{BodyStream, ConnectionLease};
use crate::error::EngineError;

pub use json_reader::JsonMessageReader;
pub use log_reader::{LogKind, LogMessage, LogMessageReader};

/// Incremental decoder turning body bytes into messages.
pub trait MessageDecoder: Send + 'static {
    /// The decoded message type.
    type Message: Send + 'static;

    /// Append freshly read bytes.
    fn feed(&mut self, chunk: &[u8]);

    /// Take the next complete message, if one is buffered.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Parse` if the buffered bytes cannot be decoded.
    fn next_message(&mut self) -> Result<Option<Self::Message>, EngineError>;

    /// Take the next message once the body has ended, flushing partial data.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Parse` if the body ended mid-message.
    fn finish(&mut self) -> Result<Option<Self::Message>, EngineError>;
}

/// Receives decoded messages, in order, on the pump task.
pub trait MessageSink<T>: Send + 'static {
    /// Handle one message.
    fn process(&mut self, message: T);
}

impl<T, F> MessageSink<T> for F
where
    F: FnMut(T) + Send + 'static,
{
    fn process(&mut self, message: T) {
        self(message);
    }
}

/// A sink forwarding messages into an unbounded channel.
///
/// Messages are discarded once the receiver has been dropped.
pub fn channel_sink<T: Send + 'static>(sender: mpsc::UnboundedSender<T>) -> impl MessageSink<T> {
    move |message: T| {
        if sender.send(message).is_err() {
            tracing::trace!("stream receiver dropped; discarding message");
        }
    }
}

/// Boxed sink, for call sites where the sink is optional.
pub type BoxSink<T> = Box<dyn MessageSink<T>>;

/// Unbox a sink into a closure so it satisfies the generic bounds again.
pub(crate) fn unbox_sink<T: 'static>(mut sink: BoxSink<T>) -> impl MessageSink<T> {
    move |message: T| sink.process(message)
}

/// Consumer driving the pump loop. Returning `Break` stops reading.
pub(crate) trait Consumer<T>: Send + 'static {
    fn consume(&mut self, message: T) -> ControlFlow<()>;
}

/// Adapts a caller sink into a consumer that never stops early.
pub(crate) struct Forward<S>(pub(crate) S);

impl<T, S: MessageSink<T>> Consumer<T> for Forward<S> {
    fn consume(&mut self, message: T) -> ControlFlow<()> {
        self.0.process(message);
        ControlFlow::Continue(())
    }
}

/// How a pumped stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// The daemon ended the stream, or the consumer stopped reading.
    Completed,
    /// The caller cancelled the stream.
    Cancelled,
}

/// Result of an operation that blocks until its stream completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T> {
    /// The stream completed and produced a value.
    Finished(T),
    /// The caller cancelled before completion.
    Cancelled,
}

impl<T> Completion<T> {
    /// The finished value, or `None` after cancellation.
    #[must_use]
    pub fn finished(self) -> Option<T> {
        match self {
            Self::Finished(value) => Some(value),
            Self::Cancelled => None,
        }
    }

    /// Whether the operation was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Transform the finished value.
    #[must_use]
    pub fn map<U>(self, transform: impl FnOnce(T) -> U) -> Completion<U> {
        match self {
            Self::Finished(value) => Completion::Finished(transform(value)),
            Self::Cancelled => Completion::Cancelled,
        }
    }
}

#[derive(Default)]
struct CancelState {
    cancelled: AtomicBool,
    lease: Mutex<Option<ConnectionLease>>,
}

/// Cloneable handle that cancels a streaming operation.
///
/// Cancelling before the stream has started is allowed: the connection is
/// closed as soon as the operation registers it.
#[derive(Clone, Default)]
pub struct StreamCanceller {
    state: Arc<CancelState>,
}

impl StreamCanceller {
    /// A fresh, uncancelled handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the stream cancelled, then close its connection.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        let lease = self
            .state
            .lease
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(active) = lease {
            tracing::debug!("closing engine stream on request");
            active.close();
        }
    }

    /// Whether [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn register(&self, lease: &ConnectionLease) {
        *self
            .state
            .lease
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(lease.clone());
        if self.is_cancelled() {
            lease.close();
        }
    }
}

impl fmt::Debug for StreamCanceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCanceller")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Handle to a fire-and-forget stream such as attach, logs or events.
///
/// Dropping the handle leaves the stream running; use [`Self::cancel`] to
/// stop it.
#[derive(Debug)]
pub struct StreamHandle {
    canceller: StreamCanceller,
    completion: oneshot::Receiver<Result<PumpOutcome, EngineError>>,
}

impl StreamHandle {
    pub(crate) const fn new(
        canceller: StreamCanceller,
        completion: oneshot::Receiver<Result<PumpOutcome, EngineError>>,
    ) -> Self {
        Self {
            canceller,
            completion,
        }
    }

    /// A canceller for this stream that can be moved to another task.
    #[must_use]
    pub fn canceller(&self) -> StreamCanceller {
        self.canceller.clone()
    }

    /// Cancel the stream.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Wait for the stream to end.
    ///
    /// # Errors
    ///
    /// Returns the transport or parse error that ended the stream.
    pub async fn wait(self) -> Result<PumpOutcome, EngineError> {
        self.completion.await.map_err(|_| pump_lost())?
    }
}

/// Messages consumed and the consumer handed back at the end of a pump.
pub(crate) struct PumpReport<C> {
    pub(crate) outcome: PumpOutcome,
    pub(crate) consumer: C,
}

impl<C> PumpReport<C> {
    const fn new(outcome: PumpOutcome, consumer: C) -> Self {
        Self { outcome, consumer }
    }
}

/// Spawn a pump over `body` and return a receiver for its mapped result.
pub(crate) fn spawn_pump<D, C, R, F>(
    body: BodyStream,
    decoder: D,
    consumer: C,
    canceller: &StreamCanceller,
    finish: F,
) -> oneshot::Receiver<R>
where
    D: MessageDecoder,
    C: Consumer<D::Message>,
    R: Send + 'static,
    F: FnOnce(Result<PumpReport<C>, EngineError>) -> R + Send + 'static,
{
    canceller.register(body.lease());
    let task_canceller = canceller.clone();
    let (sender, receiver) = oneshot::channel();
    tokio::spawn(async move {
        let result = pump(body, decoder, consumer, &task_canceller).await;
        if sender.send(finish(result)).is_err() {
            tracing::debug!("stream result dropped by caller");
        }
    });
    receiver
}

/// Spawn a pump forwarding every message to `sink`.
pub(crate) fn spawn_stream<D, S>(body: BodyStream, decoder: D, sink: S) -> StreamHandle
where
    D: MessageDecoder,
    S: MessageSink<D::Message>,
{
    let canceller = StreamCanceller::new();
    let completion = spawn_pump(body, decoder, Forward(sink), &canceller, |result| {
        result.map(|report| report.outcome)
    });
    StreamHandle::new(canceller, completion)
}

/// Await a pump result, mapping a vanished task to a transport error.
pub(crate) async fn await_pump<R>(receiver: oneshot::Receiver<R>) -> Result<R, EngineError> {
    receiver.await.map_err(|_| pump_lost())
}

fn pump_lost() -> EngineError {
    EngineError::Transport {
        message: String::from("stream task ended without reporting a result"),
    }
}

async fn pump<D, C>(
    mut body: BodyStream,
    mut decoder: D,
    mut consumer: C,
    canceller: &StreamCanceller,
) -> Result<PumpReport<C>, EngineError>
where
    D: MessageDecoder,
    C: Consumer<D::Message>,
{
    loop {
        match body.next_chunk().await {
            Some(Ok(chunk)) => {
                decoder.feed(&chunk);
                match drain(&mut decoder, &mut consumer, D::next_message) {
                    Ok(ControlFlow::Continue(())) => {}
                    Ok(ControlFlow::Break(())) => {
                        return Ok(PumpReport::new(PumpOutcome::Completed, consumer));
                    }
                    Err(_) if canceller.is_cancelled() => {
                        return Ok(PumpReport::new(PumpOutcome::Cancelled, consumer));
                    }
                    Err(error) => return Err(error),
                }
            }
            Some(Err(error)) => {
                if canceller.is_cancelled() {
                    return Ok(PumpReport::new(PumpOutcome::Cancelled, consumer));
                }
                return Err(EngineError::Transport {
                    message: format!("stream read failed: {error}"),
                });
            }
            None => {
                if canceller.is_cancelled() {
                    return Ok(PumpReport::new(PumpOutcome::Cancelled, consumer));
                }
                drain(&mut decoder, &mut consumer, D::finish)?;
                return Ok(PumpReport::new(PumpOutcome::Completed, consumer));
            }
        }
    }
}

fn drain<D, C>(
    decoder: &mut D,
    consumer: &mut C,
    next: fn(&mut D) -> Result<Option<D::Message>, EngineError>,
) -> Result<ControlFlow<()>, EngineError>
where
    D: MessageDecoder,
    C: Consumer<D::Message>,
{
    while let Some(message) = next(decoder)? {
        if consumer.consume(message).is_break() {
            return Ok(ControlFlow::Break(()));
        }
    }
    Ok(ControlFlow::Continue(()))
}
