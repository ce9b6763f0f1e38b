//! Given/When steps for streaming scenarios.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use dockyard::engine::models::ProgressMessage;
use dockyard::engine::params::{
    BuildContext, BuildImageParams, ContainerLogsParams, PullImageParams, PushImageParams,
};
use dockyard::engine::{Completion, DockerConnector, LogMessage, channel_sink};
use rstest_bdd_macros::{given, when};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use super::state::{OperationOutcome, StreamingState};
use crate::fake_daemon::{FakeDaemon, Reply};

type StepResult<T> = Result<T, String>;

fn runtime_of(state: &StreamingState) -> StepResult<Arc<Runtime>> {
    state
        .runtime
        .get()
        .ok_or_else(|| String::from("runtime should be configured"))
}

fn connector_of(state: &StreamingState) -> StepResult<DockerConnector> {
    state
        .daemon
        .get()
        .map(|daemon| daemon.connector())
        .ok_or_else(|| String::from("daemon should be started"))
}

fn start_daemon(state: &StreamingState, reply: Reply) -> StepResult<()> {
    let runtime = runtime_of(state)?;
    let daemon = FakeDaemon::start(&runtime, move |_| reply.clone());
    state.daemon.set(Arc::new(daemon));
    Ok(())
}

/// Record every progress status line, returning the sink and the shared list.
fn progress_recorder() -> (
    Arc<Mutex<Vec<String>>>,
    impl FnMut(ProgressMessage) + Send + 'static,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink = move |message: ProgressMessage| {
        let line = message
            .status
            .or(message.stream)
            .unwrap_or_default();
        sink_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    };
    (seen, sink)
}

fn record_operation(
    state: &StreamingState,
    seen: &Mutex<Vec<String>>,
    outcome: Result<Completion<Option<String>>, dockyard::error::EngineError>,
) {
    let delivered = seen.lock().unwrap_or_else(PoisonError::into_inner).clone();
    state.delivered.set(delivered);
    let recorded = match outcome {
        Ok(Completion::Finished(result)) => OperationOutcome::Succeeded { result },
        Ok(Completion::Cancelled) => OperationOutcome::Failed {
            message: String::from("cancelled"),
        },
        Err(error) => OperationOutcome::Failed {
            message: error.to_string(),
        },
    };
    state.operation.set(recorded);
}

#[given("a daemon streaming log lines that never end")]
fn daemon_streaming_logs(streaming_state: &StreamingState) -> StepResult<()> {
    start_daemon(
        streaming_state,
        Reply::endless_lines(200, &["ready", "still running"]),
    )
}

#[given("a daemon reporting pull progress")]
fn daemon_reporting_pull_progress(streaming_state: &StreamingState) -> StepResult<()> {
    start_daemon(
        streaming_state,
        Reply::lines(
            200,
            &[
                r#"{"status":"Pulling from library/busybox","id":"latest"}"#,
                r#"{"status":"Downloading","id":"a1b2","progressDetail":{"current":10,"total":20}}"#,
                r#"{"status":"Status: Downloaded newer image for busybox:latest"}"#,
            ],
        ),
    )
}

#[given("a daemon whose pull fails with {reason}")]
fn daemon_pull_fails(streaming_state: &StreamingState, reason: String) -> StepResult<()> {
    let failure = format!(r#"{{"error":"{reason}","errorDetail":{{"message":"{reason}"}}}}"#);
    start_daemon(
        streaming_state,
        Reply::lines(200, &[r#"{"status":"Pulling from library/busybox"}"#, failure.as_str()]),
    )
}

#[given("a daemon pushing tag {tag} with digest {digest}")]
fn daemon_pushing(streaming_state: &StreamingState, tag: String, digest: String) -> StepResult<()> {
    let status = format!(r#"{{"status":"{tag}: digest: {digest} size: 528"}}"#);
    start_daemon(
        streaming_state,
        Reply::lines(
            200,
            &[
                r#"{"status":"The push refers to repository [docker.io/library/app]"}"#,
                status.as_str(),
            ],
        ),
    )
}

#[given("a daemon building an image with id {image_id}")]
fn daemon_building(streaming_state: &StreamingState, image_id: String) -> StepResult<()> {
    let aux = format!(r#"{{"aux":{{"ID":"{image_id}"}}}}"#);
    start_daemon(
        streaming_state,
        Reply::lines(
            200,
            &[r#"{"stream":"Step 1/1 : FROM busybox\n"}"#, aux.as_str()],
        ),
    )
}

#[when("the logs are followed and cancelled after the first line")]
fn logs_followed_and_cancelled(streaming_state: &StreamingState) -> StepResult<()> {
    let runtime = runtime_of(streaming_state)?;
    let connector = connector_of(streaming_state)?;
    let params = ContainerLogsParams::new("web").with_follow(true);

    let (first, outcome) = runtime.block_on(async {
        let (sender, mut receiver) = mpsc::unbounded_channel::<LogMessage>();
        let handle = connector
            .container_logs(&params, channel_sink(sender))
            .await
            .map_err(|error| format!("logs should start: {error}"))?;
        let first = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
            .await
            .map_err(|_| String::from("no log line arrived in time"))?;
        handle.cancel();
        let outcome = handle
            .wait()
            .await
            .map_err(|error| format!("pump should report: {error}"))?;
        Ok::<_, String>((first, outcome))
    })?;

    streaming_state
        .delivered
        .set(first.map(|line| line.content).into_iter().collect());
    streaming_state.stream_outcome.set(outcome);
    Ok(())
}

#[when("busybox is pulled")]
fn busybox_is_pulled(streaming_state: &StreamingState) -> StepResult<()> {
    let runtime = runtime_of(streaming_state)?;
    let connector = connector_of(streaming_state)?;
    let (seen, sink) = progress_recorder();

    let outcome = runtime.block_on(connector.pull_image(&PullImageParams::new("busybox"), sink));
    record_operation(
        streaming_state,
        &seen,
        outcome.map(|completion| completion.map(|()| None)),
    );
    Ok(())
}

#[when("app:v1 is pushed")]
fn app_is_pushed(streaming_state: &StreamingState) -> StepResult<()> {
    let runtime = runtime_of(streaming_state)?;
    let connector = connector_of(streaming_state)?;
    let (seen, sink) = progress_recorder();

    let params = PushImageParams::new("app").with_tag("v1");

    let outcome = runtime.block_on(connector.push_image(&params, sink));
    record_operation(streaming_state, &seen, outcome.map(|completion| completion.map(Some)));
    Ok(())
}

#[when("a build context is uploaded")]
fn build_context_is_uploaded(streaming_state: &StreamingState) -> StepResult<()> {
    let runtime = runtime_of(streaming_state)?;
    let connector = connector_of(streaming_state)?;
    let (seen, sink) = progress_recorder();
    let params = BuildImageParams::new(BuildContext::Archive(Bytes::from_static(
        b"context archive",
    )))
    .with_tag("app:dev");

    let outcome = runtime.block_on(connector.build_image(&params, sink));
    record_operation(streaming_state, &seen, outcome.map(|completion| completion.map(Some)));
    Ok(())
}
