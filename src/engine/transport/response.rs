//! Response envelope and connection lifetime.
//!
//! A response body and the connection it is read from share one lifetime.
//! [`ConnectionLease`] runs the connection's closer exactly once, whichever
//! path gets there first: the body is dropped, fully read, or a canceller
//! closes it from another task.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt, stream};
use hyper::HeaderMap;
use serde::de::DeserializeOwned;

use crate::engine::naming;
use crate::error::EngineError;

/// Boxed stream of body chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

type Closer = Box<dyn FnOnce() + Send>;

struct LeaseState {
    closed: AtomicBool,
    closer: Mutex<Option<Closer>>,
}

/// Shared handle that closes the underlying connection exactly once.
#[derive(Clone)]
pub struct ConnectionLease {
    inner: Arc<LeaseState>,
}

impl ConnectionLease {
    /// Create a lease that runs `closer` on the first call to [`Self::close`].
    pub fn new(closer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(LeaseState {
                closed: AtomicBool::new(false),
                closer: Mutex::new(Some(Box::new(closer))),
            }),
        }
    }

    /// Close the connection. Later calls do nothing.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let closer = self
            .inner
            .closer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(close) = closer {
            close();
        }
    }

    /// Whether [`Self::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ConnectionLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionLease")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A response body that owns its connection.
///
/// Dropping the body closes the connection.
pub struct BodyStream {
    chunks: ChunkStream,
    lease: ConnectionLease,
}

impl BodyStream {
    /// Wrap a chunk stream and the lease of the connection it reads from.
    pub fn new(chunks: ChunkStream, lease: ConnectionLease) -> Self {
        Self { chunks, lease }
    }

    /// A body that yields `chunks` in order, then ends.
    pub fn from_chunks(chunks: Vec<Bytes>, lease: ConnectionLease) -> Self {
        Self::new(Box::pin(stream::iter(chunks.into_iter().map(Ok))), lease)
    }

    /// The lease of the connection behind this body.
    #[must_use]
    pub const fn lease(&self) -> &ConnectionLease {
        &self.lease
    }

    /// Read the next chunk. `None` marks the end of the body.
    pub async fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
        self.chunks.next().await
    }

    /// Read the whole body, then close the connection.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Transport` if reading fails.
    pub async fn read_to_end(self) -> Result<Bytes, EngineError> {
        self.read_limited(usize::MAX).await
    }

    /// Read at most `limit` bytes, then close the connection.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Transport` if reading fails.
    pub async fn read_limited(mut self, limit: usize) -> Result<Bytes, EngineError> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await {
            let data = chunk.map_err(|e| EngineError::Transport {
                message: format!("failed to read response body: {e}"),
            })?;
            let room = limit.saturating_sub(buffer.len());
            buffer.extend_from_slice(data.get(..room.min(data.len())).unwrap_or_default());
            if buffer.len() >= limit {
                break;
            }
        }
        Ok(buffer.freeze())
    }

    /// Close the connection now.
    pub fn close(self) {
        drop(self);
    }
}

impl Stream for BodyStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.chunks.as_mut().poll_next(cx)
    }
}

impl Drop for BodyStream {
    fn drop(&mut self) {
        self.lease.close();
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyStream")
            .field("lease", &self.lease)
            .finish_non_exhaustive()
    }
}

/// Status, headers and body of a daemon response.
#[derive(Debug)]
pub struct DockerResponse {
    status: u16,
    headers: HeaderMap,
    body: BodyStream,
}

impl DockerResponse {
    /// Assemble a response.
    pub const fn new(status: u16, headers: HeaderMap, body: BodyStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// The HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body stream, for incremental reads.
    pub const fn body_mut(&mut self) -> &mut BodyStream {
        &mut self.body
    }

    /// Take the body, leaving the connection open until it is dropped.
    #[must_use]
    pub fn into_body(self) -> BodyStream {
        self.body
    }

    /// Read the whole body and close the connection.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Transport` if reading fails.
    pub async fn bytes(self) -> Result<Bytes, EngineError> {
        self.body.read_to_end().await
    }

    /// Read the whole body as text, replacing invalid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Transport` if reading fails.
    pub async fn text(self) -> Result<String, EngineError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Decode a JSON body whose type already follows the wire spelling.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Transport` if reading fails and
    /// `EngineError::Parse` if the body does not match `T`.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, EngineError> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| EngineError::Parse {
            message: e.to_string(),
        })
    }

    /// Decode a JSON body into a snake case type via [`naming::decode`].
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Transport` if reading fails and
    /// `EngineError::Parse` if the body does not match `T`.
    pub async fn wire_json<T: DeserializeOwned>(self) -> Result<T, EngineError> {
        let bytes = self.bytes().await?;
        naming::decode(&bytes)
    }
}
