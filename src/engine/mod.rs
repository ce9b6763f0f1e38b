//! Container engine client.
//!
//! The daemon endpoint is resolved once, when a [`DockerConnector`] is
//! built, through a priority-based fallback chain:
//!
//! 1. CLI argument (`--engine-socket`)
//! 2. Config file (`engine_socket` in TOML)
//! 3. `DOCKYARD_ENGINE_SOCKET` environment variable
//! 4. `DOCKER_HOST` environment variable
//! 5. `CONTAINER_HOST` environment variable
//! 6. `PODMAN_HOST` environment variable
//! 7. Platform default (`/var/run/docker.sock` on Unix)
//!
//! Every operation then opens its own connection, sends one request and
//! closes the connection once the response has been consumed. Streaming
//! operations hand the open body to a background pump that decodes it into
//! typed messages.

pub mod archive;
pub mod auth;
mod connector;
pub mod endpoint;
pub mod models;
pub mod naming;
pub mod params;
pub mod pump;
pub mod transport;

pub use auth::{AuthConfig, AuthConfigs};
pub use connector::{ArchiveStream, ConnectorConfig, DEFAULT_HEALTH_CHECK_TIMEOUT, DockerConnector};
pub use endpoint::{Endpoint, SocketResolver};
pub use pump::{
    BoxSink, Completion, LogKind, LogMessage, MessageSink, PumpOutcome, StreamCanceller,
    StreamHandle, channel_sink,
};
pub use transport::TlsSettings;
