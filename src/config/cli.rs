//! Command-line argument definitions for dockyard.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Command-line interface for dockyard.
#[derive(Debug, Parser)]
#[command(name = "dockyard")]
#[command(
    author,
    version,
    about = "Talk to a Docker-compatible container engine"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Container engine socket path or URL.
    #[arg(long, global = true)]
    pub engine_socket: Option<String>,

    /// Engine API version to request, such as `1.43`.
    #[arg(long, global = true)]
    pub api_version: Option<String>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show daemon-wide information.
    Info,

    /// Show daemon version details.
    Version,

    /// Check that the daemon answers.
    Ping,

    /// List images.
    Images(ImagesArgs),

    /// List containers.
    Ps(PsArgs),

    /// Pull an image.
    Pull(PullArgs),

    /// Print a container's logs.
    Logs(LogsArgs),

    /// Stream daemon events.
    Events(EventsArgs),

    /// Stop a running container.
    Stop(StopArgs),

    /// Execute a command in a running container.
    Exec(ExecArgs),
}

/// Arguments for the `images` subcommand.
#[derive(Debug, Parser)]
pub struct ImagesArgs {
    /// Include intermediate images.
    #[arg(long, short)]
    pub all: bool,
}

/// Arguments for the `ps` subcommand.
#[derive(Debug, Parser)]
pub struct PsArgs {
    /// Include stopped containers.
    #[arg(long, short)]
    pub all: bool,
}

/// Arguments for the `pull` subcommand.
#[derive(Debug, Parser)]
pub struct PullArgs {
    /// Image to pull, optionally with a `:tag` suffix.
    #[arg(required = true)]
    pub image: String,

    /// Registry host to pull from.
    #[arg(long)]
    pub registry: Option<String>,
}

/// Arguments for the `logs` subcommand.
#[derive(Debug, Parser)]
pub struct LogsArgs {
    /// Container ID or name.
    #[arg(required = true)]
    pub container: String,

    /// Keep streaming new output.
    #[arg(long, short)]
    pub follow: bool,

    /// Show timestamps.
    #[arg(long, short)]
    pub timestamps: bool,

    /// Number of lines to show from the end, or `all`.
    #[arg(long)]
    pub tail: Option<String>,
}

/// Arguments for the `events` subcommand.
#[derive(Debug, Parser)]
pub struct EventsArgs {
    /// Show events created since this Unix timestamp.
    #[arg(long)]
    pub since: Option<i64>,

    /// Stop at this Unix timestamp.
    #[arg(long)]
    pub until: Option<i64>,

    /// Filter as `name=value`, for example `type=container`. Repeatable.
    #[arg(long = "filter")]
    pub filters: Vec<String>,
}

/// Arguments for the `stop` subcommand.
#[derive(Debug, Parser)]
pub struct StopArgs {
    /// Container ID or name to stop.
    #[arg(required = true)]
    pub container: String,

    /// Seconds to wait before killing the container.
    #[arg(long, short)]
    pub time: Option<u64>,
}

/// Arguments for the `exec` subcommand.
#[derive(Debug, Parser)]
pub struct ExecArgs {
    /// Container ID or name.
    #[arg(required = true)]
    pub container: String,

    /// Allocate a pseudo terminal.
    #[arg(long, short)]
    pub tty: bool,

    /// Command to execute.
    #[arg(required = true, trailing_var_arg = true)]
    pub command: Vec<String>,
}
