//! Status interpretation and daemon error construction.

use crate::engine::transport::DockerResponse;
use crate::error::EngineError;

/// Upper bound on how much of an error body is kept.
const DIAGNOSTIC_LIMIT: usize = 1024 * 1024;

/// Which statuses an operation treats as success.
#[derive(Debug, Clone, Copy)]
pub(super) enum Accept {
    /// Exactly these codes.
    Only(&'static [u16]),
    /// Any 2xx code.
    AnySuccess,
}

impl Accept {
    fn allows(self, status: u16) -> bool {
        match self {
            Self::Only(codes) => codes.contains(&status),
            Self::AnySuccess => (200..300).contains(&status),
        }
    }
}

/// Pass `response` through when its status is accepted, otherwise drain the
/// body into a daemon error and close the connection.
pub(super) async fn expect_status(
    response: DockerResponse,
    operation: &'static str,
    accept: Accept,
) -> Result<DockerResponse, EngineError> {
    if accept.allows(response.status()) {
        return Ok(response);
    }
    Err(daemon_error(response, operation).await)
}

/// Drain a rejected response into an [`EngineError::Daemon`].
pub(super) async fn daemon_error(response: DockerResponse, operation: &'static str) -> EngineError {
    let status = response.status();
    let raw = match response.into_body().read_limited(DIAGNOSTIC_LIMIT).await {
        Ok(body) => String::from_utf8_lossy(&body).into_owned(),
        Err(error) => {
            tracing::debug!(%error, status, operation, "failed to read daemon error body");
            String::new()
        }
    };
    let error = EngineError::daemon(status, raw);
    tracing::debug!(%error, operation, "daemon rejected request");
    error
}
