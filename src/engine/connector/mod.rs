//! The operation dispatcher.
//!
//! [`DockerConnector`] exposes one method per daemon operation. Every method
//! follows the same shape: validate the parameter object, open a connection,
//! build and send the request, then either decode the success body, hand the
//! open body to a stream pump, or turn the response into an
//! [`EngineError`] via the classifier.
//!
//! The connector holds no per-call state and can be shared between tasks.

mod archive;
mod build;
mod classify;
mod containers;
mod events;
mod exec;
mod images;
mod progress;
mod registry;
mod system;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use camino::Utf8PathBuf;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

pub use archive::ArchiveStream;

use super::auth::AuthConfigs;
use super::endpoint::{Endpoint, SocketResolver};
use super::params::OperationParams;
use super::transport::{ConnectionFactory, HyperConnectionFactory, RequestBuilder, TlsSettings};
use crate::config::AppConfig;
use crate::error::{DockyardError, EngineError};

/// Default time allowed for a health-check ping.
pub const DEFAULT_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain";
const TAR_CONTENT_TYPE: &str = "application/x-tar";

/// Bytes escaped when a caller-supplied value becomes one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Image references keep `/` between repository components.
const IMAGE_PATH: &AsciiSet = &PATH_SEGMENT.remove(b'/');

/// Settings fixed at connector construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// The daemon every operation targets.
    pub endpoint: Endpoint,
    /// Optional API version used as a path prefix, such as `1.43`.
    pub api_version: Option<String>,
    /// Registry credentials used when an operation does not carry its own.
    pub auth_configs: AuthConfigs,
    /// Time allowed for [`DockerConnector::health_check_async`].
    pub health_check_timeout: Duration,
}

impl ConnectorConfig {
    /// Settings for `endpoint` with no version prefix and no credentials.
    #[must_use]
    pub const fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            api_version: None,
            auth_configs: AuthConfigs::new(),
            health_check_timeout: DEFAULT_HEALTH_CHECK_TIMEOUT,
        }
    }

    /// Prefix request paths with this API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Use these registry credentials as the fallback.
    #[must_use]
    pub fn with_auth_configs(mut self, auth_configs: AuthConfigs) -> Self {
        self.auth_configs = auth_configs;
        self
    }

    /// Allow this long for health checks.
    #[must_use]
    pub const fn with_health_check_timeout(mut self, timeout: Duration) -> Self {
        self.health_check_timeout = timeout;
        self
    }
}

/// Client for one container engine daemon.
#[derive(Clone)]
pub struct DockerConnector {
    config: ConnectorConfig,
    path_prefix: String,
    factory: Arc<dyn ConnectionFactory>,
}

impl DockerConnector {
    /// Build a connector that opens connections through `factory`.
    #[must_use]
    pub fn new(config: ConnectorConfig, factory: Arc<dyn ConnectionFactory>) -> Self {
        let path_prefix = config
            .api_version
            .as_deref()
            .map(str::trim)
            .filter(|version| !version.is_empty())
            .map(|version| format!("/v{}", version.trim_start_matches('v')))
            .unwrap_or_default();
        Self {
            config,
            path_prefix,
            factory,
        }
    }

    /// Build a connector using the `hyper` transport.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Tls` if `tls` is given and its certificate
    /// material cannot be loaded.
    pub fn connect(config: ConnectorConfig, tls: Option<&TlsSettings>) -> Result<Self, EngineError> {
        let factory = match tls {
            Some(settings) => HyperConnectionFactory::with_tls(settings)?,
            None => HyperConnectionFactory::new(),
        };
        Ok(Self::new(config, Arc::new(factory)))
    }

    /// Build a connector from application configuration.
    ///
    /// The endpoint is resolved from the configured socket, then
    /// `DOCKER_HOST`, `CONTAINER_HOST` and `PODMAN_HOST`, then the platform
    /// default. When TLS verification is enabled, plain TCP endpoints are
    /// upgraded to TLS and the certificates are read from the configured
    /// directory, falling back to `DOCKER_CERT_PATH`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidArgument` for an unusable endpoint and
    /// `EngineError::Tls` for missing or invalid certificates.
    pub fn from_app_config<E: mockable::Env>(
        app: &AppConfig,
        env: &E,
    ) -> Result<Self, DockyardError> {
        let resolver = SocketResolver::new(env);
        let parsed = resolver.resolve_endpoint(app.engine_socket.as_deref())?;
        let endpoint = if app.tls.verify {
            parsed.into_tls()
        } else {
            parsed
        };

        let tls = if endpoint.is_tls() {
            let cert_dir = app
                .tls
                .cert_path
                .clone()
                .or_else(|| env.string("DOCKER_CERT_PATH").map(Utf8PathBuf::from))
                .ok_or_else(|| EngineError::Tls {
                    message: format!("no certificate directory configured for {endpoint}"),
                })?;
            Some(TlsSettings::from_cert_dir(&cert_dir))
        } else {
            None
        };

        let mut config = ConnectorConfig::new(endpoint)
            .with_auth_configs(AuthConfigs::from(app.registry_auth.clone()))
            .with_health_check_timeout(Duration::from_secs(app.health_check_timeout_secs));
        if let Some(version) = &app.api_version {
            config = config.with_api_version(version.clone());
        }
        Ok(Self::connect(config, tls.as_ref())?)
    }

    /// The daemon this connector talks to.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    /// The fallback registry credentials.
    #[must_use]
    pub const fn auth_configs(&self) -> &AuthConfigs {
        &self.config.auth_configs
    }

    /// Validate `params`, then open a connection for the request.
    fn prepare<P: OperationParams>(&self, params: &P) -> Result<RequestBuilder, EngineError> {
        params.validate()?;
        Ok(self.open())
    }

    fn open(&self) -> RequestBuilder {
        RequestBuilder::new(self.factory.open_connection(&self.config.endpoint))
    }

    fn path(&self, path: &str) -> String {
        format!("{}{path}", self.path_prefix)
    }
}

/// Percent-encode an id or name interpolated into a request path.
fn segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Percent-encode an image reference, keeping its `/` separators.
fn image_segment(value: &str) -> String {
    utf8_percent_encode(value, IMAGE_PATH).to_string()
}

/// Attach a body with explicit `Content-Type` and `Content-Length` headers.
fn with_entity(builder: RequestBuilder, content_type: &str, body: impl Into<Bytes>) -> RequestBuilder {
    let bytes = body.into();
    builder
        .header("Content-Type", content_type)
        .header("Content-Length", bytes.len().to_string())
        .entity(bytes)
}

/// Mark a bodiless POST the way the daemon's plain-text endpoints expect.
fn without_entity(builder: RequestBuilder) -> RequestBuilder {
    builder
        .header("Content-Type", TEXT_CONTENT_TYPE)
        .header("Content-Length", "0")
}

impl fmt::Debug for DockerConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DockerConnector")
            .field("endpoint", &self.config.endpoint)
            .field("api_version", &self.config.api_version)
            .finish_non_exhaustive()
    }
}
