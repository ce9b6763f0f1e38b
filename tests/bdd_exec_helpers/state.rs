//! Scenario state for command execution behavioural tests.

use std::sync::Arc;

use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use tokio::runtime::Runtime;

use crate::fake_daemon::FakeDaemon;

#[derive(Debug, Clone)]
pub(crate) enum ExecutionOutcome {
    Success,
    Exit { code: i64 },
    Failure { status: Option<u16>, message: String },
}

#[derive(Default, ScenarioState)]
pub(crate) struct ExecState {
    pub(crate) runtime: Slot<Arc<Runtime>>,
    pub(crate) daemon: Slot<Arc<FakeDaemon>>,
    pub(crate) output: Slot<Vec<String>>,
    pub(crate) outcome: Slot<ExecutionOutcome>,
}

#[fixture]
#[expect(clippy::expect_used, reason = "test fixture - panics are acceptable")]
pub(crate) fn exec_state() -> ExecState {
    let state = ExecState::default();
    let runtime = Runtime::new().expect("runtime should be created");
    state.runtime.set(Arc::new(runtime));
    state.output.set(Vec::new());
    state
}
