//! Connector tests against scripted in-memory connections.


use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use rstest::fixture;

use super::{ConnectorConfig, DockerConnector};
use crate::engine::endpoint::Endpoint;
use crate::engine::pump::MessageSink;
use crate::engine::transport::testing::RecordingFactory;

#[fixture]
pub(super) fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().expect("runtime should be created")
}

pub(super) fn endpoint() -> Endpoint {
    Endpoint::Unix {
        path: PathBuf::from("/var/run/docker.sock"),
    }
}

pub(super) fn connector(factory: &RecordingFactory) -> DockerConnector {
    DockerConnector::new(ConnectorConfig::new(endpoint()), Arc::new(factory.clone()))
}

pub(super) fn connector_with(
    factory: &RecordingFactory,
    configure: impl FnOnce(ConnectorConfig) -> ConnectorConfig,
) -> DockerConnector {
    DockerConnector::new(configure(ConnectorConfig::new(endpoint())), Arc::new(factory.clone()))
}

/// A sink recording every message it receives.
pub(super) fn collecting<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl MessageSink<T>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink = move |message: T| {
        sink_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    };
    (seen, sink)
}

pub(super) fn taken<T>(seen: &Arc<Mutex<Vec<T>>>) -> Vec<T> {
    std::mem::take(&mut *seen.lock().unwrap_or_else(PoisonError::into_inner))
}

pub(super) fn body_text(request: &crate::engine::transport::DockerRequest) -> String {
    request
        .body()
        .map(|body| String::from_utf8_lossy(body).into_owned())
        .unwrap_or_default()
}
