//! Then steps for command execution scenarios.

use rstest_bdd_macros::then;

use super::state::{ExecState, ExecutionOutcome};

type StepResult<T> = Result<T, String>;

fn outcome_of(exec_state: &ExecState) -> StepResult<ExecutionOutcome> {
    exec_state
        .outcome
        .get()
        .ok_or_else(|| String::from("execution outcome should be recorded"))
}

#[then("the command outcome is success")]
fn command_outcome_is_success(exec_state: &ExecState) -> StepResult<()> {
    match outcome_of(exec_state)? {
        ExecutionOutcome::Success => Ok(()),
        other => Err(format!("expected success, got {other:?}")),
    }
}

#[then("the command outcome is exit code {code}")]
fn command_outcome_is_exit_code(exec_state: &ExecState, code: i64) -> StepResult<()> {
    match outcome_of(exec_state)? {
        ExecutionOutcome::Exit { code: actual } if actual == code => Ok(()),
        other => Err(format!("expected exit code {code}, got {other:?}")),
    }
}

#[then("the captured output is {text}")]
fn captured_output_is(exec_state: &ExecState, text: String) -> StepResult<()> {
    let output = exec_state.output.get().unwrap_or_default();
    if output == [text.clone()] {
        Ok(())
    } else {
        Err(format!("expected output [{text}], got {output:?}"))
    }
}

#[then("the exec start request asked to detach")]
fn exec_start_asked_to_detach(exec_state: &ExecState) -> StepResult<()> {
    let daemon = exec_state
        .daemon
        .get()
        .ok_or_else(|| String::from("daemon should be started"))?;
    let start = daemon
        .requests()
        .into_iter()
        .find(|request| request.path() == "/exec/x1/start")
        .ok_or_else(|| String::from("exec start request should be recorded"))?;
    let body = String::from_utf8_lossy(&start.body);
    if body.contains(r#""Detach":true"#) {
        Ok(())
    } else {
        Err(format!("exec start body did not detach: {body}"))
    }
}

#[then("execution fails with status {status}")]
fn execution_fails_with_status(exec_state: &ExecState, status: u16) -> StepResult<()> {
    match outcome_of(exec_state)? {
        ExecutionOutcome::Failure {
            status: actual,
            message,
        } => {
            if actual == Some(status) {
                Ok(())
            } else {
                Err(format!("expected status {status}, got {actual:?}: {message}"))
            }
        }
        other => Err(format!("expected failure with status {status}, got {other:?}")),
    }
}
