//! Daemon-wide queries and health checks.

use super::DockerConnector;
use super::classify::{Accept, expect_status};
use crate::engine::models::{SystemInfo, SystemVersion};
use crate::error::EngineError;

impl DockerConnector {
    /// Fetch daemon-wide information (`GET /info`).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Daemon` for a non-200 status, a transport error
    /// if the daemon cannot be reached, or `EngineError::Parse` for an
    /// unexpected body.
    pub async fn info(&self) -> Result<SystemInfo, EngineError> {
        let response = self.open().path(&self.path("/info")).request().await?;
        expect_status(response, "info", Accept::Only(&[200]))
            .await?
            .json()
            .await
    }

    /// Fetch daemon and API version details (`GET /version`).
    ///
    /// # Errors
    ///
    /// As for [`Self::info`].
    pub async fn version(&self) -> Result<SystemVersion, EngineError> {
        let response = self.open().path(&self.path("/version")).request().await?;
        expect_status(response, "version", Accept::Only(&[200]))
            .await?
            .json()
            .await
    }

    /// Ping the daemon (`GET /_ping`) and return its answer, normally `OK`.
    ///
    /// # Errors
    ///
    /// As for [`Self::info`].
    pub async fn ping(&self) -> Result<String, EngineError> {
        let response = self.open().path(&self.path("/_ping")).request().await?;
        expect_status(response, "ping", Accept::Only(&[200]))
            .await?
            .text()
            .await
    }

    /// Verify the daemon answers a ping within the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::HealthCheckTimeout` if no answer arrives in
    /// time, otherwise the error [`Self::ping`] produced.
    pub async fn health_check_async(&self) -> Result<(), EngineError> {
        let timeout = self.config.health_check_timeout;
        tokio::time::timeout(timeout, self.ping())
            .await
            .map_err(|_| EngineError::HealthCheckTimeout {
                seconds: timeout.as_secs(),
            })??;
        Ok(())
    }

    /// Blocking form of [`Self::health_check_async`] for callers without a
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::RuntimeCreationFailed` if a runtime cannot be
    /// created, otherwise as for [`Self::health_check_async`].
    pub fn health_check(&self) -> Result<(), EngineError> {
        let runtime = create_runtime()?;
        runtime.block_on(self.health_check_async())
    }
}

/// Create a tokio runtime for synchronous operations.
pub(crate) fn create_runtime() -> Result<tokio::runtime::Runtime, EngineError> {
    tokio::runtime::Runtime::new().map_err(|e| EngineError::RuntimeCreationFailed {
        message: e.to_string(),
    })
}
