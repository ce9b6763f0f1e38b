//! Configuration system for dockyard.
//!
//! This module provides the configuration structures and CLI definitions for
//! the dockyard binary. Configuration loading and precedence merging is
//! handled by the `ortho_config` crate: CLI flags override environment
//! variables, which override configuration files, which override defaults.
//!
//! The configuration file is expected at `~/.config/dockyard/config.toml` by
//! default.
//!
//! # Example Configuration
//!
//! ```toml
//! engine_socket = "tcp://build-host.internal:2376"
//! api_version = "1.43"
//! health_check_timeout_secs = 5
//!
//! [tls]
//! verify = true
//! cert_path = "/home/user/.docker/build-host"
//!
//! [registry_auth."registry.example.com"]
//! username = "ci"
//! password = "s3cret"
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{
    Cli, Commands, EventsArgs, ExecArgs, ImagesArgs, LogsArgs, PsArgs, PullArgs, StopArgs,
};
pub use loader::{env_var_names, load_config};
pub use types::{AppConfig, DEFAULT_HEALTH_CHECK_TIMEOUT_SECS, TlsConfig};
