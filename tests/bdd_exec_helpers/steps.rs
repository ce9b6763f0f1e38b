//! Given/When steps for command execution scenarios.

use std::sync::{Arc, Mutex, PoisonError};

use dockyard::api::{self, CommandOutcome, ExecCommand};
use dockyard::engine::{BoxSink, LogMessage};
use dockyard::error::DockyardError;
use rstest_bdd_macros::{given, when};

use super::state::{ExecState, ExecutionOutcome};
use crate::fake_daemon::{FakeDaemon, RecordedRequest, Reply};

type StepResult<T> = Result<T, String>;

fn exec_reply(container: &str, exit_code: i64, request: &RecordedRequest) -> Reply {
    let create_path = format!("/containers/{container}/exec");
    match request.path() {
        path if path == create_path => Reply::text(201, r#"{"Id":"x1"}"#),
        "/exec/x1/start" => {
            let body = String::from_utf8_lossy(&request.body);
            if body.contains(r#""Detach":true"#) {
                Reply::status(200)
            } else {
                Reply::lines(200, &["hello"])
            }
        }
        "/exec/x1/json" => Reply::text(
            200,
            &format!(r#"{{"ID":"x1","Running":false,"ExitCode":{exit_code}}}"#),
        ),
        _ => Reply::text(404, r#"{"message":"No such container"}"#),
    }
}

#[given("a container {container} whose exec exits with {code}")]
fn container_whose_exec_exits(
    exec_state: &ExecState,
    container: String,
    code: i64,
) -> StepResult<()> {
    let runtime = exec_state
        .runtime
        .get()
        .ok_or_else(|| String::from("runtime should be configured"))?;
    let daemon = FakeDaemon::start(&runtime, move |request| {
        exec_reply(&container, code, request)
    });
    exec_state.daemon.set(Arc::new(daemon));
    Ok(())
}

fn execute(
    exec_state: &ExecState,
    command: &str,
    container: &str,
    attached: bool,
) -> StepResult<()> {
    let runtime = exec_state
        .runtime
        .get()
        .ok_or_else(|| String::from("runtime should be configured"))?;
    let daemon = exec_state
        .daemon
        .get()
        .ok_or_else(|| String::from("daemon should be started"))?;
    let connector = daemon.connector();

    let captured = Arc::new(Mutex::new(Vec::new()));
    let output = attached.then(|| {
        let sink_captured = Arc::clone(&captured);
        let sink: BoxSink<LogMessage> = Box::new(move |message: LogMessage| {
            sink_captured
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(message.content);
        });
        sink
    });
    let request = ExecCommand {
        container,
        command: command.split_whitespace().map(String::from).collect(),
        tty: false,
    };

    let result = runtime.block_on(api::exec_and_wait(&connector, request, output));
    let outcome = match result {
        Ok(CommandOutcome::Success) => ExecutionOutcome::Success,
        Ok(CommandOutcome::CommandExit { code }) => ExecutionOutcome::Exit { code },
        Err(DockyardError::Engine(error)) => ExecutionOutcome::Failure {
            status: error.status(),
            message: error.to_string(),
        },
        Err(error) => ExecutionOutcome::Failure {
            status: None,
            message: error.to_string(),
        },
    };
    exec_state.outcome.set(outcome);
    exec_state.output.set(
        captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone(),
    );
    Ok(())
}

#[when("{command} is executed in {container} with output attached")]
fn executed_attached(
    exec_state: &ExecState,
    command: String,
    container: String,
) -> StepResult<()> {
    execute(exec_state, &command, &container, true)
}

#[when("{command} is executed in {container} detached")]
fn executed_detached(
    exec_state: &ExecState,
    command: String,
    container: String,
) -> StepResult<()> {
    execute(exec_state, &command, &container, false)
}

