//! Scenario state for streaming behavioural tests.

use std::sync::Arc;

use dockyard::engine::PumpOutcome;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use tokio::runtime::Runtime;

use crate::fake_daemon::FakeDaemon;

/// How a blocking streamed operation ended.
#[derive(Debug, Clone)]
pub(crate) enum OperationOutcome {
    Succeeded { result: Option<String> },
    Failed { message: String },
}

#[derive(Default, ScenarioState)]
pub(crate) struct StreamingState {
    pub(crate) runtime: Slot<Arc<Runtime>>,
    pub(crate) daemon: Slot<Arc<FakeDaemon>>,
    pub(crate) delivered: Slot<Vec<String>>,
    pub(crate) stream_outcome: Slot<PumpOutcome>,
    pub(crate) operation: Slot<OperationOutcome>,
}

#[fixture]
#[expect(clippy::expect_used, reason = "test fixture - panics are acceptable")]
pub(crate) fn streaming_state() -> StreamingState {
    let state = StreamingState::default();
    let runtime = Runtime::new().expect("runtime should be created");
    state.runtime.set(Arc::new(runtime));
    state.delivered.set(Vec::new());
    state
}
