//! Scenario state for configuration behavioural tests.

use dockyard::config::AppConfig;
use ortho_config::serde_json::Value;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

/// State shared across configuration test scenarios.
#[derive(Default, ScenarioState)]
pub(crate) struct ConfigState {
    /// The loaded application configuration.
    pub(crate) config: Slot<AppConfig>,
    /// The captured configuration parsing error.
    pub(crate) parse_error: Slot<String>,
    /// File layer JSON value for layer precedence tests.
    pub(crate) file_layer: Slot<Value>,
    /// Environment layer JSON value for layer precedence tests.
    pub(crate) env_layer: Slot<Value>,
    /// CLI layer JSON value for layer precedence tests.
    pub(crate) cli_layer: Slot<Value>,
}

/// Fixture providing a fresh configuration state.
#[fixture]
pub(crate) fn config_state() -> ConfigState {
    ConfigState::default()
}
