//! Shared fixtures and helper functions for config tests.

use std::sync::Arc;

use ortho_config::MergeComposer;
use rstest::fixture;

use crate::config::{AppConfig, DEFAULT_HEALTH_CHECK_TIMEOUT_SECS};

/// Fixture providing an `AppConfig` parsed from a full TOML example.
#[fixture]
pub fn app_config_from_full_toml() -> AppConfig {
    let toml = r#"
        engine_socket = "tcp://build-host.internal:2376"
        api_version = "1.43"
        health_check_timeout_secs = 5

        [tls]
        verify = true
        cert_path = "/certs/build-host"

        [registry_auth."registry.example.com"]
        username = "ci"
        password = "s3cret"

        [registry_auth."docker.io"]
        identitytoken = "token-123"
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing an `AppConfig` parsed from a minimal TOML example.
#[fixture]
pub fn app_config_from_partial_toml() -> AppConfig {
    let toml = r#"
        engine_socket = "unix:///tmp/docker.sock"
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Helper: Creates a `MergeComposer` with defaults layer already pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(AppConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Helper: Merges layers from a composer into `AppConfig`.
pub fn merge_config(composer: MergeComposer) -> Result<AppConfig, Arc<ortho_config::OrthoError>> {
    AppConfig::merge_from_layers(composer.layers())
}

/// Helper: Asserts that a config has all default values.
pub fn assert_config_has_defaults(config: &AppConfig) {
    assert!(
        config.engine_socket.is_none(),
        "engine_socket should be None"
    );
    assert!(config.api_version.is_none(), "api_version should be None");
    assert!(!config.tls.verify, "tls.verify should be false");
    assert!(config.tls.cert_path.is_none(), "tls.cert_path should be None");
    assert!(
        config.registry_auth.is_empty(),
        "registry_auth should be empty"
    );
    assert_eq!(
        config.health_check_timeout_secs, DEFAULT_HEALTH_CHECK_TIMEOUT_SECS,
        "health_check_timeout_secs should be the default"
    );
}

/// Helper: Creates a `MergeComposer` with defaults, file, and env layers for
/// testing layer precedence.
pub fn create_composer_with_file_and_env() -> Result<MergeComposer, serde_json::Error> {
    use ortho_config::serde_json::json;

    let mut composer = create_composer_with_defaults()?;

    composer.push_file(
        json!({
            "engine_socket": "unix:///from/file.sock",
            "api_version": "1.41"
        }),
        None,
    );

    composer.push_environment(json!({
        "engine_socket": "unix:///from/env.sock"
    }));

    Ok(composer)
}
