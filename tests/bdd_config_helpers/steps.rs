//! Step definitions for configuration scenarios.

use dockyard::config::AppConfig;
use ortho_config::MergeComposer;
use ortho_config::serde_json::json;
use rstest_bdd_macros::{given, then, when};

use super::state::ConfigState;

#[expect(clippy::expect_used, reason = "test helper - panics are acceptable")]
fn get_config(config_state: &ConfigState) -> AppConfig {
    config_state
        .config
        .get()
        .expect("configuration should be set")
}

#[given("no configuration is provided")]
fn no_configuration_provided(config_state: &ConfigState) {
    config_state.config.set(AppConfig::default());
}

#[given("a configuration file with TLS verification and registry credentials")]
#[expect(clippy::expect_used, reason = "test step - panics are acceptable")]
fn config_with_tls_and_credentials(config_state: &ConfigState) {
    let toml = r#"
        [tls]
        verify = true
        cert_path = "/etc/docker/certs"

        [registry_auth."registry.example.com"]
        username = "ci"
        password = "s3cret"
    "#;
    let config = toml::from_str::<AppConfig>(toml).expect("TOML should parse");
    config_state.config.set(config);
}

#[given("a configuration file with a non-numeric health check timeout")]
#[expect(clippy::expect_used, reason = "test step - panics are acceptable")]
fn config_with_bad_timeout(config_state: &ConfigState) {
    let toml = r#"health_check_timeout_secs = "soon""#;
    let error = toml::from_str::<AppConfig>(toml)
        .expect_err("TOML parsing should fail for a non-numeric timeout");
    config_state.parse_error.set(error.to_string());
}

#[given("a file layer provides engine_socket as {socket}")]
fn file_layer_provides_engine_socket(config_state: &ConfigState, socket: String) {
    config_state
        .file_layer
        .set(json!({ "engine_socket": socket }));
}

#[given("an environment layer provides engine_socket as {socket}")]
fn env_layer_provides_engine_socket(config_state: &ConfigState, socket: String) {
    config_state
        .env_layer
        .set(json!({ "engine_socket": socket }));
}

#[given("an environment layer provides a blank engine_socket")]
fn env_layer_provides_blank_engine_socket(config_state: &ConfigState) {
    config_state
        .env_layer
        .set(json!({ "engine_socket": "   " }));
}

#[given("a CLI layer provides engine_socket as {socket}")]
fn cli_layer_provides_engine_socket(config_state: &ConfigState, socket: String) {
    config_state
        .cli_layer
        .set(json!({ "engine_socket": socket }));
}

#[when("configuration is merged")]
#[expect(clippy::expect_used, reason = "test step - panics are acceptable")]
fn configuration_is_merged(config_state: &ConfigState) {
    let mut composer = MergeComposer::new();

    let defaults = ortho_config::serde_json::to_value(AppConfig::default())
        .expect("serialization should succeed");
    composer.push_defaults(defaults);
    if let Some(file_layer) = config_state.file_layer.get() {
        composer.push_file(file_layer, None);
    }
    if let Some(env_layer) = config_state.env_layer.get() {
        composer.push_environment(env_layer);
    }
    if let Some(cli_layer) = config_state.cli_layer.get() {
        composer.push_cli(cli_layer);
    }

    let mut config =
        AppConfig::merge_from_layers(composer.layers()).expect("merge should succeed");
    config.normalise();
    config_state.config.set(config);
}

#[then("no engine socket is configured")]
fn engine_socket_is_unset(config_state: &ConfigState) {
    let config = get_config(config_state);
    assert!(
        config.engine_socket.is_none(),
        "Expected no engine socket, got {:?}",
        config.engine_socket
    );
}

#[then("the engine socket is {socket}")]
fn engine_socket_is(config_state: &ConfigState, socket: String) {
    let config = get_config(config_state);
    assert_eq!(config.engine_socket.as_deref(), Some(socket.as_str()));
}

#[then("the health check timeout is {seconds} seconds")]
fn health_check_timeout_is(config_state: &ConfigState, seconds: u64) {
    assert_eq!(get_config(config_state).health_check_timeout_secs, seconds);
}

#[then("TLS verification is disabled")]
fn tls_verification_disabled(config_state: &ConfigState) {
    assert!(!get_config(config_state).tls.verify);
}

#[then("TLS verification is enabled")]
fn tls_verification_enabled(config_state: &ConfigState) {
    assert!(get_config(config_state).tls.verify);
}

#[then("credentials are configured for {registry}")]
fn credentials_configured_for(config_state: &ConfigState, registry: String) {
    let config = get_config(config_state);
    assert!(
        config.registry_auth.contains_key(&registry),
        "Expected credentials for {registry}"
    );
}

#[then("the configuration load fails")]
#[expect(clippy::expect_used, reason = "test step - panics are acceptable")]
fn configuration_load_fails(config_state: &ConfigState) {
    let error = config_state
        .parse_error
        .get()
        .expect("a parse error should be recorded");
    assert!(
        error.contains("health_check_timeout_secs") || error.contains("invalid type"),
        "Unexpected error: {error}"
    );
}
