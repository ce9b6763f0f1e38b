//! Behavioural tests for dockyard configuration.
//!
//! These tests validate the configuration loading and default behaviour using
//! rstest-bdd.

mod bdd_config_helpers;

use bdd_config_helpers::{ConfigState, config_state};
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/configuration.feature",
    name = "Default configuration values"
)]
fn default_configuration(config_state: ConfigState) {
    let _ = config_state;
}

#[scenario(
    path = "tests/features/configuration.feature",
    name = "Configuration file enables TLS and registry credentials"
)]
fn configuration_file_enables_tls(config_state: ConfigState) {
    let _ = config_state;
}

#[scenario(
    path = "tests/features/configuration.feature",
    name = "Environment overrides the configuration file"
)]
fn environment_overrides_file(config_state: ConfigState) {
    let _ = config_state;
}

#[scenario(
    path = "tests/features/configuration.feature",
    name = "Command line overrides every other layer"
)]
fn command_line_overrides_all(config_state: ConfigState) {
    let _ = config_state;
}

#[scenario(
    path = "tests/features/configuration.feature",
    name = "Blank engine socket counts as unset"
)]
fn blank_engine_socket_is_unset(config_state: ConfigState) {
    let _ = config_state;
}

#[scenario(
    path = "tests/features/configuration.feature",
    name = "Invalid health check timeout is rejected"
)]
fn invalid_health_check_timeout(config_state: ConfigState) {
    let _ = config_state;
}
