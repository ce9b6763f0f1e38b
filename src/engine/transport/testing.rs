//! Scripted in-memory connections for unit tests.
//!
//! [`RecordingFactory`] counts how many connections were opened and closed
//! and keeps every request it was asked to send, so tests can assert on the
//! wire form of an operation without a daemon.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use hyper::HeaderMap;
use tokio::sync::oneshot;

use super::{
    BodyStream, ConnectionFactory, ConnectionLease, DockerConnection, DockerRequest,
    DockerResponse, SendFuture,
};
use crate::engine::endpoint::Endpoint;
use crate::error::EngineError;

/// Canned response returned by a [`RecordingFactory`].
#[derive(Debug, Clone)]
pub(crate) struct FakeResponse {
    status: u16,
    chunks: Vec<Bytes>,
    hold_open: bool,
}

impl FakeResponse {
    /// A response with an empty body.
    pub(crate) const fn status(status: u16) -> Self {
        Self {
            status,
            chunks: Vec::new(),
            hold_open: false,
        }
    }

    /// A response with a single-chunk body.
    pub(crate) fn body(status: u16, body: impl Into<String>) -> Self {
        Self::status(status).with_chunks([body.into()])
    }

    /// Replace the body with the given chunks.
    pub(crate) fn with_chunks<I, S>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chunks = chunks
            .into_iter()
            .map(|chunk| Bytes::from(chunk.into()))
            .collect();
        self
    }

    /// Replace the body with raw bytes.
    pub(crate) fn with_bytes(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.chunks = chunks.into_iter().map(Bytes::from).collect();
        self
    }

    /// Keep the body open after the last chunk until the connection closes.
    pub(crate) const fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

type Responder = dyn Fn(&DockerRequest) -> Result<FakeResponse, EngineError> + Send + Sync;

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    requests: Mutex<Vec<DockerRequest>>,
}

/// Connection factory that records traffic and answers from a closure.
#[derive(Clone)]
pub(crate) struct RecordingFactory {
    counters: Arc<Counters>,
    responder: Arc<Responder>,
}

impl Default for RecordingFactory {
    fn default() -> Self {
        Self::responding(|_| Ok(FakeResponse::status(200)))
    }
}

impl RecordingFactory {
    /// A factory answering every request with `responder`.
    pub(crate) fn responding<F>(responder: F) -> Self
    where
        F: Fn(&DockerRequest) -> Result<FakeResponse, EngineError> + Send + Sync + 'static,
    {
        Self {
            counters: Arc::new(Counters::default()),
            responder: Arc::new(responder),
        }
    }

    /// A factory answering every request with the same response.
    pub(crate) fn always(response: FakeResponse) -> Self {
        Self::responding(move |_| Ok(response.clone()))
    }

    /// Number of connections opened so far.
    pub(crate) fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Number of connections closed so far.
    pub(crate) fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }

    /// Every request sent so far, in order.
    pub(crate) fn requests(&self) -> Vec<DockerRequest> {
        self.counters
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent request.
    pub(crate) fn last_request(&self) -> Option<DockerRequest> {
        self.requests().pop()
    }
}

impl ConnectionFactory for RecordingFactory {
    fn open_connection(&self, _endpoint: &Endpoint) -> Box<dyn DockerConnection> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeConnection {
            factory: self.clone(),
        })
    }
}

struct FakeConnection {
    factory: RecordingFactory,
}

impl DockerConnection for FakeConnection {
    fn send(self: Box<Self>, request: DockerRequest) -> SendFuture {
        Box::pin(async move {
            self.factory
                .counters
                .requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request.clone());
            let response = (self.factory.responder)(&request)?;
            Ok(build_response(response, Arc::clone(&self.factory.counters)))
        })
    }
}

fn build_response(response: FakeResponse, counters: Arc<Counters>) -> DockerResponse {
    let (closed_tx, closed_rx) = oneshot::channel::<()>();
    let lease = ConnectionLease::new(move || {
        counters.closed.fetch_add(1, Ordering::SeqCst);
        drop(closed_tx.send(()));
    });

    let chunks = stream::iter(response.chunks.into_iter().map(Ok::<Bytes, io::Error>));
    let body = if response.hold_open {
        let tail = stream::once(async move {
            drop(closed_rx.await);
            Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "connection closed",
            ))
        });
        BodyStream::new(Box::pin(chunks.chain(tail)), lease)
    } else {
        BodyStream::new(Box::pin(chunks), lease)
    };
    DockerResponse::new(response.status, HeaderMap::new(), body)
}
