//! `dockyard` application entry point.
//!
//! A small command-line front end over the dockyard engine client. It uses
//! `eyre` for opaque error handling at the application boundary, converting
//! domain-specific errors into human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/dockyard/config.toml` or path from `DOCKYARD_CONFIG_PATH`)
//! 3. Environment variables (`DOCKYARD_*`)
//! 4. Command-line arguments

use std::io::IsTerminal;
use std::time::Duration;

use clap::Parser;
use eyre::{Report, Result as EyreResult};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use dockyard::api::{self, CommandOutcome, ExecCommand};
use dockyard::config::{
    AppConfig, Cli, Commands, EventsArgs, ExecArgs, LogsArgs, PullArgs, load_config,
};
use dockyard::engine::models::{EventMessage, ProgressMessage};
use dockyard::engine::params::{
    ContainerLogsParams, EventsParams, ListContainersParams, ListImagesParams, PullImageParams,
};
use dockyard::engine::{
    BoxSink, DockerConnector, LogKind, LogMessage, PumpOutcome, StreamCanceller, StreamHandle,
};
use dockyard::error::{EngineError, Result as DockyardResult};

/// Application entry point.
///
/// Loads configuration with layered precedence via `OrthoConfig`, then
/// dispatches to the appropriate subcommand handler on a Tokio runtime.
fn main() -> EyreResult<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(&cli).map_err(Report::from)?;

    let runtime = tokio::runtime::Runtime::new().map_err(|error| {
        Report::from(EngineError::RuntimeCreationFailed {
            message: error.to_string(),
        })
    })?;

    match runtime.block_on(run(&cli, &config)).map_err(Report::from)? {
        CommandOutcome::Success => Ok(()),
        CommandOutcome::CommandExit { code } => std::process::exit(process_exit_code(code)),
    }
}

/// Log to stderr, filtered by `RUST_LOG` and defaulting to warnings.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Clamp an engine exit code into the range a process can report.
fn process_exit_code(code: i64) -> i32 {
    i32::try_from(code).unwrap_or(1)
}

/// Execute the CLI command, returning domain-specific errors.
///
/// Keeps semantic errors inside the run loop so the CLI boundary owns
/// conversion to `eyre::Report`.
async fn run(cli: &Cli, config: &AppConfig) -> DockyardResult<CommandOutcome> {
    let connector = DockerConnector::from_app_config(config, &mockable::DefaultEnv::new())?;

    match &cli.command {
        Commands::Info => print_json(&connector.info().await?),
        Commands::Version => print_json(&connector.version().await?),
        Commands::Ping => {
            connector.health_check_async().await?;
            print_line(&format!("{} is reachable", connector.endpoint()));
            Ok(CommandOutcome::Success)
        }
        Commands::Images(args) => {
            let params = ListImagesParams::new().with_all(args.all);
            print_json(&connector.list_images(&params).await?)
        }
        Commands::Ps(args) => {
            let params = ListContainersParams::new().with_all(args.all);
            print_json(&connector.list_containers(&params).await?)
        }
        Commands::Pull(args) => pull_image(&connector, args).await,
        Commands::Logs(args) => container_logs(&connector, args).await,
        Commands::Events(args) => stream_events(&connector, args).await,
        Commands::Stop(args) => {
            api::stop_container(&connector, &args.container, args.time.map(Duration::from_secs))
                .await
        }
        Commands::Exec(args) => exec_in_container(&connector, args).await,
    }
}

async fn pull_image(connector: &DockerConnector, args: &PullArgs) -> DockyardResult<CommandOutcome> {
    let (image, tag) = split_image_reference(&args.image);
    let canceller = StreamCanceller::default();
    let mut params = PullImageParams::new(image).with_canceller(canceller.clone());
    if let Some(requested) = tag {
        params = params.with_tag(requested);
    }
    if let Some(registry) = &args.registry {
        params = params.with_registry(registry.clone());
    }

    let interrupt = tokio::spawn(cancel_on_interrupt(canceller));
    let result = connector.pull_image(&params, print_progress).await;
    interrupt.abort();

    if result?.is_cancelled() {
        return Err(EngineError::Cancelled.into());
    }
    Ok(CommandOutcome::Success)
}

async fn container_logs(
    connector: &DockerConnector,
    args: &LogsArgs,
) -> DockyardResult<CommandOutcome> {
    let mut params = ContainerLogsParams::new(args.container.clone())
        .with_streams(true, true)
        .with_follow(args.follow)
        .with_timestamps(args.timestamps);
    if let Some(tail) = &args.tail {
        params = params.with_tail(tail.clone());
    }
    let handle = connector.container_logs(&params, print_log_line).await?;
    wait_or_interrupt(handle).await?;
    Ok(CommandOutcome::Success)
}

async fn stream_events(
    connector: &DockerConnector,
    args: &EventsArgs,
) -> DockyardResult<CommandOutcome> {
    let mut params = EventsParams::new();
    if let Some(since) = args.since {
        params = params.with_since(since);
    }
    if let Some(until) = args.until {
        params = params.with_until(until);
    }
    for filter in &args.filters {
        let (name, value) = filter.split_once('=').ok_or_else(|| {
            EngineError::invalid_argument(
                "events",
                format!("filter '{filter}' is not of the form name=value"),
            )
        })?;
        params = params.with_filter(name, value);
    }
    let handle = connector
        .events(&params, |event: EventMessage| print_event(&event))
        .await?;
    wait_or_interrupt(handle).await?;
    Ok(CommandOutcome::Success)
}

async fn exec_in_container(
    connector: &DockerConnector,
    args: &ExecArgs,
) -> DockyardResult<CommandOutcome> {
    let tty = args.tty && std::io::stdin().is_terminal();
    let request = ExecCommand {
        container: &args.container,
        command: args.command.clone(),
        tty,
    };
    let output: BoxSink<LogMessage> = Box::new(print_log_line);
    api::exec_and_wait(connector, request, Some(output)).await
}

/// Wait for a stream to end, cancelling it on Ctrl-C.
async fn wait_or_interrupt(handle: StreamHandle) -> Result<PumpOutcome, EngineError> {
    let interrupt = tokio::spawn(cancel_on_interrupt(handle.canceller()));
    let outcome = handle.wait().await;
    interrupt.abort();
    outcome
}

async fn cancel_on_interrupt(canceller: StreamCanceller) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::debug!("interrupt received; cancelling stream");
        canceller.cancel();
    }
}

/// Split `name[:tag]`, ignoring colons that belong to a registry port.
fn split_image_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') => (name, Some(tag)),
        _ => (reference, None),
    }
}

fn print_json<T: Serialize>(value: &T) -> DockyardResult<CommandOutcome> {
    let rendered = serde_json::to_string_pretty(value).map_err(|error| EngineError::Parse {
        message: error.to_string(),
    })?;
    print_line(&rendered);
    Ok(CommandOutcome::Success)
}

#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn print_line(line: &str) {
    println!("{line}");
}

#[expect(
    clippy::print_stderr,
    reason = "container stderr is forwarded to the terminal's stderr"
)]
fn print_log_line(message: LogMessage) {
    let LogMessage { kind, content } = message;
    match kind {
        LogKind::Stderr => eprintln!("{content}"),
        LogKind::Stdin | LogKind::Stdout | LogKind::Raw => print_line(&content),
    }
}

fn print_progress(message: ProgressMessage) {
    let text = [message.id, message.status, message.progress]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if !text.is_empty() {
        print_line(&text);
    }
}

fn print_event(event: &EventMessage) {
    match serde_json::to_string(event) {
        Ok(line) => print_line(&line),
        Err(error) => tracing::warn!(%error, "could not render event"),
    }
}
