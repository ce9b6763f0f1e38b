//! Configuration loading with layered precedence.
//!
//! This module provides functions to load configuration with the precedence order
//! (lowest to highest): application defaults, configuration file, environment
//! variables, command-line arguments.
//!
//! Layers are composed with `MergeComposer` directly: the `Cli` struct owns
//! subcommand dispatch, and typed environment values are validated here
//! instead of being dropped silently.
//!
//! # Environment Variable Handling
//!
//! Environment variables with unparseable values (e.g., `DOCKYARD_TLS_VERIFY=maybe`
//! instead of `true`/`false`) return an error immediately rather than silently
//! falling back to defaults.
//!
//! String fields (e.g., `DOCKYARD_ENGINE_SOCKET`) are always accepted. Typed fields
//! like booleans (`DOCKYARD_TLS_VERIFY`) or integers
//! (`DOCKYARD_HEALTH_CHECK_TIMEOUT_SECS`) must have valid values or loading fails.
//!
//! Registry credentials are only read from the configuration file, never from
//! the environment or the command line.

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};

use crate::config::{AppConfig, Cli};
use crate::error::{ConfigError, Result};

// ============================================================================
// Environment Variable Specification Table
// ============================================================================

/// The type of value expected from an environment variable.
#[derive(Clone, Copy)]
enum EnvVarType {
    /// String value (always accepted).
    String,
    /// Boolean value (`true`/`false`). Invalid values return an error.
    Bool,
    /// Unsigned 64-bit integer. Invalid values return an error.
    U64,
}

/// Specification for a single environment variable mapping.
struct EnvVarSpec {
    /// The environment variable name (e.g., `DOCKYARD_ENGINE_SOCKET`).
    env_var: &'static str,
    /// The JSON path segments (e.g., `["tls", "verify"]`).
    path: &'static [&'static str],
    /// The expected value type.
    var_type: EnvVarType,
}

/// Table of all environment variables and their JSON paths.
///
/// Adding or modifying environment variable mappings is a single-line change here.
/// The order doesn't matter as the table is processed in a single pass.
const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "DOCKYARD_ENGINE_SOCKET",
        path: &["engine_socket"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "DOCKYARD_API_VERSION",
        path: &["api_version"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "DOCKYARD_HEALTH_CHECK_TIMEOUT_SECS",
        path: &["health_check_timeout_secs"],
        var_type: EnvVarType::U64,
    },
    // TLS fields
    EnvVarSpec {
        env_var: "DOCKYARD_TLS_VERIFY",
        path: &["tls", "verify"],
        var_type: EnvVarType::Bool,
    },
    EnvVarSpec {
        env_var: "DOCKYARD_TLS_CERT_PATH",
        path: &["tls", "cert_path"],
        var_type: EnvVarType::String,
    },
];

/// Returns the list of environment variable names recognised by the config loader.
///
/// Tests use this to clear every `DOCKYARD_*` variable the loader reads.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Load a configuration file and push it to the composer.
///
/// Uses `cap_std::fs_utf8` for capability-oriented filesystem access as per
/// project conventions. The function opens the parent directory of the config
/// file and reads from there.
fn load_config_file(path: &Utf8PathBuf, composer: &mut MergeComposer) -> Result<()> {
    // Open the parent directory using ambient authority, then read the file.
    let current_dir = Utf8PathBuf::from(".");
    let parent = path.parent().unwrap_or_else(|| current_dir.as_ref());
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    composer.push_file(value, Some(path.clone()));
    Ok(())
}

/// Load configuration with full layer precedence.
///
/// This function loads configuration from all available sources:
/// 1. Application defaults defined in the struct
/// 2. Configuration file (discovered via XDG paths or `DOCKYARD_CONFIG_PATH`)
/// 3. Environment variables prefixed with `DOCKYARD_`
/// 4. Command-line arguments (from the provided `Cli`)
///
/// Later sources override earlier ones.
///
/// # Errors
///
/// Returns `ConfigError` if configuration loading fails due to:
/// - Malformed configuration files
/// - Invalid typed environment variable values (e.g., non-boolean for
///   `DOCKYARD_TLS_VERIFY`)
/// - Missing required fields after merge
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut composer = MergeComposer::new();

    // Layer 1: Defaults (serialised from AppConfig::default()).
    let defaults =
        serde_json::to_value(AppConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    // Layer 2: Configuration file.
    // Use the CLI-provided path (if it exists), or discover via XDG paths.
    let config_path: Option<Utf8PathBuf> =
        cli.config.clone().filter(|p| p.exists()).or_else(|| {
            // Discover config files using ortho_config's ConfigDiscovery builder.
            let discovery = ConfigDiscovery::builder("dockyard")
                .env_var("DOCKYARD_CONFIG_PATH")
                .config_file_name("config.toml")
                .dotfile_name(".dockyard.toml")
                .build();
            discovery
                .candidates()
                .into_iter()
                .filter(|p| p.exists())
                .find_map(|p| Utf8PathBuf::try_from(p).ok())
        });

    if let Some(ref path) = config_path {
        load_config_file(path, &mut composer)?;
    }

    // Layer 3: Environment variables.
    let env_values = collect_env_vars()?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    // Layer 4: CLI overrides.
    let cli_overrides =
        build_cli_overrides(cli.engine_socket.as_deref(), cli.api_version.as_deref());
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    // Merge all layers into the final configuration.
    let mut config =
        AppConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;
    config.normalise();

    Ok(config)
}

/// Collect environment variables with the `DOCKYARD_` prefix into a JSON value.
///
/// This function uses a data-driven approach: all environment variable mappings
/// are defined in [`ENV_VAR_SPECS`]. Adding or changing mappings requires only
/// a single-line change in that table.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if a typed environment variable (bool, u64)
/// has an unparseable value. This fail-fast approach ensures misconfigurations are
/// visible to users.
fn collect_env_vars() -> Result<Value> {
    let mut root = Map::new();

    for spec in ENV_VAR_SPECS {
        let Ok(raw_value) = std::env::var(spec.env_var) else {
            continue;
        };

        // Parse the value according to its expected type.
        // Invalid values return an error immediately (fail-fast).
        let json_value = match spec.var_type {
            EnvVarType::String => Value::String(raw_value),
            EnvVarType::Bool => match raw_value.parse::<bool>() {
                Ok(b) => Value::Bool(b),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected bool (true/false), got '{raw_value}'"),
                    }
                    .into());
                }
            },
            EnvVarType::U64 => match raw_value.parse::<u64>() {
                Ok(n) => Value::Number(n.into()),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected unsigned integer, got '{raw_value}'"),
                    }
                    .into());
                }
            },
        };

        // Insert at the appropriate path (supports arbitrary nesting depth).
        insert_at_path(&mut root, spec.path, json_value);
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

/// Insert a value at a nested path in a JSON map.
///
/// For a path like `["tls", "verify"]`, this creates the intermediate `tls`
/// object if needed and inserts `verify` within it.
fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    // Navigate to the parent object, creating intermediate objects as needed.
    let mut current = root;
    for &segment in parents {
        // Ensure the entry is an object; if it's not (shouldn't happen with our
        // controlled path specs), skip this insertion.
        let entry = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }

    // Insert the final field.
    current.insert(field.to_owned(), value);
}

/// Build a JSON value containing CLI overrides.
fn build_cli_overrides(engine_socket: Option<&str>, api_version: Option<&str>) -> Value {
    let overrides: Map<String, Value> = [
        ("engine_socket", engine_socket),
        ("api_version", api_version),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|text| (key.to_owned(), Value::from(text))))
    .collect();

    if overrides.is_empty() {
        Value::Null
    } else {
        Value::Object(overrides)
    }
}
