//! Then steps for streaming scenarios.

use std::time::Duration;

use dockyard::engine::PumpOutcome;
use rstest_bdd_macros::then;

use super::state::{OperationOutcome, StreamingState};

type StepResult<T> = Result<T, String>;

#[then("the stream outcome is cancelled")]
fn stream_outcome_is_cancelled(streaming_state: &StreamingState) -> StepResult<()> {
    match streaming_state.stream_outcome.get() {
        Some(PumpOutcome::Cancelled) => Ok(()),
        other => Err(format!("expected a cancelled stream, got {other:?}")),
    }
}

#[then("the first delivered line is {line}")]
fn first_delivered_line_is(streaming_state: &StreamingState, line: String) -> StepResult<()> {
    let delivered = streaming_state.delivered.get().unwrap_or_default();
    match delivered.first() {
        Some(first) if *first == line => Ok(()),
        other => Err(format!("expected first line {line:?}, got {other:?}")),
    }
}

#[then("the daemon sees the connection close")]
fn daemon_sees_connection_close(streaming_state: &StreamingState) -> StepResult<()> {
    let daemon = streaming_state
        .daemon
        .get()
        .ok_or_else(|| String::from("daemon should be started"))?;
    for _ in 0..50 {
        if daemon.disconnects() == 1 {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    Err(format!(
        "expected one closed stream, saw {}",
        daemon.disconnects()
    ))
}

#[then("{count} progress messages are delivered")]
fn progress_messages_delivered(streaming_state: &StreamingState, count: usize) -> StepResult<()> {
    let delivered = streaming_state.delivered.get().unwrap_or_default();
    if delivered.len() == count {
        Ok(())
    } else {
        Err(format!("expected {count} messages, got {delivered:?}"))
    }
}

#[then("the operation succeeds")]
fn operation_succeeds(streaming_state: &StreamingState) -> StepResult<()> {
    match streaming_state.operation.get() {
        Some(OperationOutcome::Succeeded { .. }) => Ok(()),
        other => Err(format!("expected success, got {other:?}")),
    }
}

#[then("the operation fails with {reason}")]
fn operation_fails_with(streaming_state: &StreamingState, reason: String) -> StepResult<()> {
    match streaming_state.operation.get() {
        Some(OperationOutcome::Failed { message }) if message.contains(&reason) => Ok(()),
        other => Err(format!("expected a failure mentioning {reason:?}, got {other:?}")),
    }
}

#[then("the reported result is {expected}")]
fn reported_result_is(streaming_state: &StreamingState, expected: String) -> StepResult<()> {
    match streaming_state.operation.get() {
        Some(OperationOutcome::Succeeded { result: Some(value) }) if value == expected => Ok(()),
        other => Err(format!("expected result {expected:?}, got {other:?}")),
    }
}
