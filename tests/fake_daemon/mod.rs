//! A scripted engine daemon listening on a temporary Unix socket.
//!
//! Each accepted connection carries exactly one request. The daemon records
//! the request, asks the test's responder for a [`Reply`], writes it and
//! closes the connection. Streaming replies can be held open so a test can
//! observe cancellation from the client side.

#![expect(clippy::expect_used, reason = "expect is standard practice in tests")]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dockyard::engine::{ConnectorConfig, DockerConnector, Endpoint};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

/// A request as the daemon received it.
#[derive(Debug, Clone, Default)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Path and query string.
    pub target: String,
    /// Header names (lower-cased) and values, in arrival order.
    pub headers: Vec<(String, String)>,
    /// The request body.
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// The first value of the named header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The path without its query string.
    pub fn path(&self) -> &str {
        self.target
            .split_once('?')
            .map_or(self.target.as_str(), |(path, _)| path)
    }
}

/// What the daemon sends back.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A complete response with a `Content-Length` body.
    Full {
        /// Status code.
        status: u16,
        /// Response body.
        body: Vec<u8>,
    },
    /// A chunked response, optionally left open after the last chunk.
    Chunked {
        /// Status code.
        status: u16,
        /// Body chunks, written and flushed one at a time.
        chunks: Vec<Vec<u8>>,
        /// Keep the connection open until the client closes it.
        hold_open: bool,
    },
}

impl Reply {
    /// A bodiless response.
    pub const fn status(status: u16) -> Self {
        Self::Full {
            status,
            body: Vec::new(),
        }
    }

    /// A JSON or text response.
    pub fn text(status: u16, body: &str) -> Self {
        Self::Full {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    /// A stream of newline-terminated text chunks that then ends.
    pub fn lines(status: u16, lines: &[&str]) -> Self {
        Self::Chunked {
            status,
            chunks: lines
                .iter()
                .map(|line| format!("{line}\n").into_bytes())
                .collect(),
            hold_open: false,
        }
    }

    /// Like [`Reply::lines`] but the stream never ends on its own.
    pub fn endless_lines(status: u16, lines: &[&str]) -> Self {
        match Self::lines(status, lines) {
            Self::Chunked { status: code, chunks, .. } => Self::Chunked {
                status: code,
                chunks,
                hold_open: true,
            },
            full @ Self::Full { .. } => full,
        }
    }
}

type Responder = dyn Fn(&RecordedRequest) -> Reply + Send + Sync;

#[derive(Default)]
struct Traffic {
    requests: Mutex<Vec<RecordedRequest>>,
    disconnects: AtomicUsize,
}

/// A running fake daemon. Dropping it stops the accept loop.
pub struct FakeDaemon {
    _dir: TempDir,
    socket: PathBuf,
    traffic: Arc<Traffic>,
    accept_loop: JoinHandle<()>,
}

impl FakeDaemon {
    /// Start listening on `runtime`, answering every request with `responder`.
    pub fn start<F>(runtime: &Runtime, responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Reply + Send + Sync + 'static,
    {
        let dir = tempfile::tempdir().expect("temporary directory should be created");
        let socket = dir.path().join("engine.sock");
        let listener = {
            let _entered = runtime.enter();
            UnixListener::bind(&socket).expect("fake daemon socket should bind")
        };
        let traffic = Arc::new(Traffic::default());
        let responder: Arc<Responder> = Arc::new(responder);

        let loop_traffic = Arc::clone(&traffic);
        let accept_loop = runtime.spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let conn_traffic = Arc::clone(&loop_traffic);
                let conn_responder = Arc::clone(&responder);
                tokio::spawn(async move {
                    if let Err(error) = serve(stream, conn_traffic, conn_responder).await {
                        tracing::debug!(%error, "fake daemon connection ended early");
                    }
                });
            }
        });

        Self {
            _dir: dir,
            socket,
            traffic,
            accept_loop,
        }
    }

    /// The socket the daemon listens on.
    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// A connector pointed at this daemon over the real transport.
    pub fn connector(&self) -> DockerConnector {
        self.connector_with(|config| config)
    }

    /// A connector pointed at this daemon, with extra configuration.
    pub fn connector_with(
        &self,
        configure: impl FnOnce(ConnectorConfig) -> ConnectorConfig,
    ) -> DockerConnector {
        let endpoint = Endpoint::Unix {
            path: self.socket.clone(),
        };
        DockerConnector::connect(configure(ConnectorConfig::new(endpoint)), None)
            .expect("connector should be created")
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.traffic
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of held-open streams the client has closed.
    pub fn disconnects(&self) -> usize {
        self.traffic.disconnects.load(Ordering::SeqCst)
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve(
    mut stream: UnixStream,
    traffic: Arc<Traffic>,
    responder: Arc<Responder>,
) -> std::io::Result<()> {
    let Some(request) = read_request(&mut stream).await else {
        return Ok(());
    };
    let reply = responder(&request);
    traffic
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request);

    match reply {
        Reply::Full { status, body } => {
            let mut head = format!("HTTP/1.1 {status} {}\r\n", reason(status));
            if !matches!(status, 204 | 304) {
                head.push_str("Content-Type: application/json\r\n");
                head.push_str(&format!("Content-Length: {}\r\n", body.len()));
            }
            head.push_str("Connection: close\r\n\r\n");
            let mut bytes = head.into_bytes();
            bytes.extend_from_slice(&body);
            stream.write_all(&bytes).await?;
            stream.shutdown().await
        }
        Reply::Chunked {
            status,
            chunks,
            hold_open,
        } => {
            let head = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n",
                reason(status)
            );
            stream.write_all(head.as_bytes()).await?;
            for chunk in chunks {
                let mut framed = format!("{:x}\r\n", chunk.len()).into_bytes();
                framed.extend_from_slice(&chunk);
                framed.extend_from_slice(b"\r\n");
                stream.write_all(&framed).await?;
                stream.flush().await?;
            }
            if hold_open {
                wait_for_client_close(&mut stream).await;
                traffic.disconnects.fetch_add(1, Ordering::SeqCst);
                Ok(())
            } else {
                stream.write_all(b"0\r\n\r\n").await?;
                stream.shutdown().await
            }
        }
    }
}

async fn wait_for_client_close(stream: &mut UnixStream) {
    let mut scratch = [0_u8; 256];
    loop {
        match stream.read(&mut scratch).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

async fn read_request(stream: &mut UnixStream) -> Option<RecordedRequest> {
    let mut buffer = Vec::new();
    let mut scratch = [0_u8; 4096];
    let head_end = loop {
        if let Some(position) = find_head_end(&buffer) {
            break position;
        }
        let read = stream.read(&mut scratch).await.ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(scratch.get(..read)?);
    };

    let head = String::from_utf8_lossy(buffer.get(..head_end)?).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_owned();
    let target = request_line.next()?.to_owned();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_owned()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buffer.get(head_end + 4..)?.to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut scratch).await.ok()?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(scratch.get(..read)?);
    }

    Some(RecordedRequest {
        method,
        target,
        headers,
        body,
    })
}

fn find_head_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

const fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        304 => "Not Modified",
        400 => "Bad Request",
        404 => "Not Found",
        409 => "Conflict",
        _ => "Internal Server Error",
    }
}
