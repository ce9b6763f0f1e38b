//! Daemon endpoint parsing and socket resolution.
//!
//! An endpoint is resolved once, when the connector is built, from multiple
//! sources (configuration, environment variables, platform default) and then
//! parsed into an [`Endpoint`] that every operation targets.

use std::fmt;
use std::path::{Path, PathBuf};

use url::{Host, Url};

use crate::error::EngineError;

/// Environment variable names checked in fallback order after configuration sources.
const FALLBACK_ENV_VARS: &[&str] = &["DOCKER_HOST", "CONTAINER_HOST", "PODMAN_HOST"];

/// Default socket path for Unix platforms.
const DEFAULT_SOCKET: &str = "unix:///var/run/docker.sock";

/// Port used for plain TCP endpoints without an explicit port.
const DEFAULT_TCP_PORT: u16 = 2375;

/// Port used for TLS endpoints without an explicit port.
const DEFAULT_TLS_PORT: u16 = 2376;

/// Resolves container engine socket endpoints from environment variables.
///
/// # Type Parameters
///
/// * `E` - An environment provider implementing the `mockable::Env` trait,
///   allowing for testable environment variable access.
pub struct SocketResolver<'a, E: mockable::Env> {
    env: &'a E,
}

impl<'a, E: mockable::Env> SocketResolver<'a, E> {
    /// Creates a new socket resolver with the given environment provider.
    #[must_use]
    pub const fn new(env: &'a E) -> Self {
        Self { env }
    }

    /// Resolves the socket endpoint from fallback environment variables.
    ///
    /// Checks `DOCKER_HOST`, `CONTAINER_HOST` and `PODMAN_HOST` in that order
    /// and returns `None` if none is set or all are empty.
    #[must_use]
    pub fn resolve_from_env(&self) -> Option<String> {
        FALLBACK_ENV_VARS
            .iter()
            .filter_map(|var_name| self.env.string(var_name))
            .find(|value| !value.is_empty())
    }

    /// Returns the platform default socket URI.
    #[must_use]
    pub const fn default_socket() -> &'static str {
        DEFAULT_SOCKET
    }

    /// Resolves the socket URI without parsing it.
    ///
    /// Resolution order:
    /// 1. `config_socket` (from CLI, config file, or `DOCKYARD_ENGINE_SOCKET`)
    /// 2. `DOCKER_HOST`, `CONTAINER_HOST`, `PODMAN_HOST`
    /// 3. Platform default socket
    #[must_use]
    pub fn resolve_socket(&self, config_socket: Option<&str>) -> String {
        config_socket
            .filter(|s| !s.is_empty())
            .map(String::from)
            .or_else(|| self.resolve_from_env())
            .unwrap_or_else(|| Self::default_socket().to_owned())
    }

    /// Resolves and parses the endpoint in one step.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` when the resolved value is not a
    /// supported endpoint URI.
    pub fn resolve_endpoint(&self, config_socket: Option<&str>) -> Result<Endpoint, EngineError> {
        Endpoint::parse(&self.resolve_socket(config_socket))
    }
}

/// A container engine endpoint.
///
/// Immutable once built; every request issued by a connector targets the
/// same endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A Unix domain socket.
    Unix {
        /// Filesystem path of the socket.
        path: PathBuf,
    },
    /// Plain HTTP over TCP.
    Tcp {
        /// Host name or address.
        host: String,
        /// TCP port.
        port: u16,
    },
    /// HTTPS over TCP.
    Tls {
        /// Host name or address, also used for server name verification.
        host: String,
        /// TCP port.
        port: u16,
    },
}

impl Endpoint {
    /// Parse an endpoint URI.
    ///
    /// Supported forms are `unix:///path`, bare absolute paths, `tcp://host:port`,
    /// `http://host:port` and `https://host:port`. Missing TCP ports default
    /// to 2375 (plain) and 2376 (TLS).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for empty values, unknown
    /// schemes, named pipes and URIs without a host.
    pub fn parse(uri: &str) -> Result<Self, EngineError> {
        let trimmed = uri.trim();
        if trimmed.is_empty() {
            return Err(invalid("endpoint is empty"));
        }

        if let Some(path) = trimmed.strip_prefix("unix://") {
            return Self::unix(path);
        }
        if trimmed.starts_with('/') && !trimmed.starts_with("//") {
            return Self::unix(trimmed);
        }
        if trimmed.starts_with("npipe://") || trimmed.starts_with("\\\\") {
            return Err(invalid(format!(
                "named pipe endpoints are not supported: {trimmed}"
            )));
        }

        let url = Url::parse(trimmed).map_err(|e| invalid(format!("{trimmed}: {e}")))?;
        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_owned(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(invalid(format!("endpoint has no host: {trimmed}"))),
        };

        match url.scheme() {
            "tcp" | "http" => Ok(Self::Tcp {
                host,
                port: url.port().unwrap_or(DEFAULT_TCP_PORT),
            }),
            "https" => Ok(Self::Tls {
                host,
                port: url.port().unwrap_or(DEFAULT_TLS_PORT),
            }),
            other => Err(invalid(format!("unsupported endpoint scheme: {other}"))),
        }
    }

    fn unix(path: &str) -> Result<Self, EngineError> {
        if path.is_empty() {
            return Err(invalid("unix socket path is empty"));
        }
        Ok(Self::Unix {
            path: PathBuf::from(path),
        })
    }

    /// Upgrade a plain TCP endpoint to TLS. Other endpoints are unchanged.
    #[must_use]
    pub fn into_tls(self) -> Self {
        match self {
            Self::Tcp { host, port } => Self::Tls { host, port },
            other => other,
        }
    }

    /// Value for the `Host` header of requests sent to this endpoint.
    #[must_use]
    pub fn host_header(&self) -> String {
        match self {
            Self::Unix { .. } => String::from("localhost"),
            Self::Tcp { host, port } | Self::Tls { host, port } => authority(host, *port),
        }
    }

    /// Filesystem path of a Unix socket endpoint.
    #[must_use]
    pub fn socket_path(&self) -> Option<&Path> {
        match self {
            Self::Unix { path } => Some(path),
            Self::Tcp { .. } | Self::Tls { .. } => None,
        }
    }

    /// Whether requests to this endpoint are encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls { .. })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(f, "unix://{}", path.display()),
            Self::Tcp { host, port } => write!(f, "tcp://{}", authority(host, *port)),
            Self::Tls { host, port } => write!(f, "https://{}", authority(host, *port)),
        }
    }
}

/// `host:port`, bracketing IPv6 addresses.
fn authority(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::invalid_argument("resolve endpoint", message)
}
