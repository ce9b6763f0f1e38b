//! Configuration data types for dockyard.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};

use crate::engine::AuthConfig;

/// Seconds allowed for a health-check ping unless configured otherwise.
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;

/// TLS settings for `https://` and `tcp://` endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Use TLS even when the endpoint is given as plain `tcp://`.
    pub verify: bool,

    /// Directory holding `ca.pem`, `cert.pem` and `key.pem`.
    ///
    /// Falls back to `DOCKER_CERT_PATH` when unset.
    pub cert_path: Option<Utf8PathBuf>,
}

/// Root application configuration.
///
/// This structure is loaded from configuration files, environment variables,
/// and command-line arguments with layered precedence. The precedence order
/// (lowest to highest) is: defaults, configuration file, environment variables,
/// command-line arguments.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `DOCKYARD_CONFIG_PATH` environment variable
/// 2. `.dockyard.toml` in the current working directory
/// 3. `.dockyard.toml` in the home directory
/// 4. `~/.config/dockyard/config.toml` (XDG default)
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "DOCKYARD",
    post_merge_hook,
    discovery(
        app_name = "dockyard",
        env_var = "DOCKYARD_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".dockyard.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// The container engine socket path or URL.
    pub engine_socket: Option<String>,

    /// API version used as a request path prefix, such as `1.43`.
    pub api_version: Option<String>,

    /// TLS configuration.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub tls: TlsConfig,

    /// Registry credentials keyed by registry address.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub registry_auth: BTreeMap<String, AuthConfig>,

    /// Seconds allowed for a health-check ping.
    #[serde(default = "default_health_check_timeout_secs")]
    #[ortho_config(skip_cli)]
    pub health_check_timeout_secs: u64,
}

const fn default_health_check_timeout_secs() -> u64 {
    DEFAULT_HEALTH_CHECK_TIMEOUT_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine_socket: None,
            api_version: None,
            tls: TlsConfig::default(),
            registry_auth: BTreeMap::new(),
            health_check_timeout_secs: DEFAULT_HEALTH_CHECK_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Trim string settings and treat blank ones as unset.
    ///
    /// Empty environment variables otherwise shadow file values with `""`.
    pub fn normalise(&mut self) {
        self.engine_socket = non_blank(self.engine_socket.take());
        self.api_version = non_blank(self.api_version.take());
    }
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        self.normalise();
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
