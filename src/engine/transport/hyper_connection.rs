//! HTTP/1.1 connections over Unix sockets, TCP and TLS using `hyper`.
//!
//! Every request gets its own connection. The connection driver runs on a
//! spawned task; the response's [`ConnectionLease`] aborts that task, which
//! drops the socket and unblocks any pending body read.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyDataStream, Full};
use hyper::Request;
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};
use tokio_rustls::TlsConnector;

use super::error_classification::{classify_connect_error, classify_exchange_error};
use super::{
    BodyStream, ConnectionFactory, ConnectionLease, DockerConnection, DockerRequest,
    DockerResponse, SendFuture, TlsSettings,
};
use crate::engine::endpoint::Endpoint;
use crate::error::EngineError;

/// Connection factory backed by `hyper` client connections.
#[derive(Clone, Default)]
pub struct HyperConnectionFactory {
    tls: Option<Arc<ClientConfig>>,
}

impl HyperConnectionFactory {
    /// A factory for Unix socket and plain TCP endpoints.
    #[must_use]
    pub const fn new() -> Self {
        Self { tls: None }
    }

    /// A factory that can also reach `https://` endpoints.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Tls` if the certificate material cannot be loaded.
    pub fn with_tls(settings: &TlsSettings) -> Result<Self, EngineError> {
        Ok(Self {
            tls: Some(settings.client_config()?),
        })
    }
}

impl ConnectionFactory for HyperConnectionFactory {
    fn open_connection(&self, endpoint: &Endpoint) -> Box<dyn DockerConnection> {
        Box::new(HyperConnection {
            endpoint: endpoint.clone(),
            tls: self.tls.clone(),
        })
    }
}

struct HyperConnection {
    endpoint: Endpoint,
    tls: Option<Arc<ClientConfig>>,
}

impl DockerConnection for HyperConnection {
    fn send(self: Box<Self>, request: DockerRequest) -> SendFuture {
        Box::pin(async move { self.dispatch(request).await })
    }
}

impl HyperConnection {
    async fn dispatch(self, request: DockerRequest) -> Result<DockerResponse, EngineError> {
        match &self.endpoint {
            Endpoint::Unix { path } => {
                let stream = UnixStream::connect(path)
                    .await
                    .map_err(|e| classify_connect_error(&e, &self.endpoint))?;
                exchange(stream, request, &self.endpoint).await
            }
            Endpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port))
                    .await
                    .map_err(|e| classify_connect_error(&e, &self.endpoint))?;
                exchange(stream, request, &self.endpoint).await
            }
            Endpoint::Tls { host, port } => {
                let config = self.tls.clone().ok_or_else(|| EngineError::Tls {
                    message: format!("no TLS configuration for {}", self.endpoint),
                })?;
                let server_name =
                    ServerName::try_from(host.clone()).map_err(|e| EngineError::Tls {
                        message: format!("invalid server name {host}: {e}"),
                    })?;
                let tcp = TcpStream::connect((host.as_str(), *port))
                    .await
                    .map_err(|e| classify_connect_error(&e, &self.endpoint))?;
                let stream = TlsConnector::from(config)
                    .connect(server_name, tcp)
                    .await
                    .map_err(|e| EngineError::Tls {
                        message: format!("handshake with {} failed: {e}", self.endpoint),
                    })?;
                exchange(stream, request, &self.endpoint).await
            }
        }
    }
}

/// Run one request/response exchange over a connected stream.
async fn exchange<S>(
    stream: S,
    request: DockerRequest,
    endpoint: &Endpoint,
) -> Result<DockerResponse, EngineError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let http_request = to_http_request(request, endpoint)?;
    let io = TokioIo::new(stream);
    let (mut sender, conn) = http1::handshake(io)
        .await
        .map_err(|e| classify_exchange_error(&e, endpoint))?;

    let driver = tokio::spawn(async move {
        if let Err(error) = conn.await {
            tracing::debug!(%error, "engine connection closed with error");
        }
    });
    let abort = driver.abort_handle();

    let response = match sender.send_request(http_request).await {
        Ok(response) => response,
        Err(error) => {
            abort.abort();
            return Err(classify_exchange_error(&error, endpoint));
        }
    };

    let (parts, incoming) = response.into_parts();
    let lease = ConnectionLease::new(move || {
        drop(sender);
        abort.abort();
        tracing::trace!("engine connection released");
    });
    Ok(DockerResponse::new(
        parts.status.as_u16(),
        parts.headers,
        BodyStream::new(body_chunks(incoming), lease),
    ))
}

fn body_chunks(incoming: Incoming) -> super::ChunkStream {
    Box::pin(BodyDataStream::new(incoming).map_err(std::io::Error::other))
}

fn to_http_request(
    request: DockerRequest,
    endpoint: &Endpoint,
) -> Result<Request<Full<Bytes>>, EngineError> {
    let mut builder = Request::builder()
        .method(request.method().clone())
        .uri(request.target())
        .header(hyper::header::HOST, endpoint.host_header());
    for (name, value) in request.headers() {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let body = request.body().cloned().unwrap_or_default();
    builder
        .body(Full::new(body))
        .map_err(|e| EngineError::invalid_argument("build request", e.to_string()))
}
