//! Registry credentials and their request-header encodings.
//!
//! Pull and push carry a single [`AuthConfig`] in `X-Registry-Auth`; builds
//! carry every known credential as an [`AuthConfigs`] map in
//! `X-Registry-Config`. Both headers hold base64url-encoded JSON.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Header carrying credentials for pull and push.
pub const REGISTRY_AUTH_HEADER: &str = "X-Registry-Auth";

/// Header carrying the credential map for builds.
pub const REGISTRY_CONFIG_HEADER: &str = "X-Registry-Config";

/// Registry keys the daemon treats as Docker Hub.
const DOCKER_HUB_KEYS: &[&str] = &["https://index.docker.io/v1/", "docker.io", "index.docker.io"];

/// Credentials for one registry.
///
/// Field names follow the daemon's lowercase spelling for auth payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Registry user name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Registry password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Account e-mail, still accepted by older registries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Registry address these credentials belong to.
    #[serde(
        rename = "serveraddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub server_address: Option<String>,

    /// Identity token issued by the registry, used instead of a password.
    #[serde(
        rename = "identitytoken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub identity_token: Option<String>,
}

impl AuthConfig {
    /// Credentials from a user name and password.
    #[must_use]
    pub fn with_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Set the registry address.
    #[must_use]
    pub fn with_server_address(mut self, server_address: impl Into<String>) -> Self {
        self.server_address = Some(server_address.into());
        self
    }

    /// Encode as an `X-Registry-Auth` header value.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Parse` if serialisation fails.
    pub fn to_header_value(&self) -> Result<String, EngineError> {
        encode_header(self)
    }
}

/// Credentials keyed by registry address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthConfigs {
    configs: BTreeMap<String, AuthConfig>,
}

impl AuthConfigs {
    /// An empty credential map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            configs: BTreeMap::new(),
        }
    }

    /// Add or replace the credentials for `registry`.
    #[must_use]
    pub fn with(mut self, registry: impl Into<String>, config: AuthConfig) -> Self {
        self.configs.insert(registry.into(), config);
        self
    }

    /// Whether no credentials are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Find the credentials for a registry.
    ///
    /// `None` looks up Docker Hub under any of the keys the daemon accepts
    /// for it.
    #[must_use]
    pub fn for_registry(&self, registry: Option<&str>) -> Option<&AuthConfig> {
        match registry {
            Some(name) => self.configs.get(name),
            None => DOCKER_HUB_KEYS
                .iter()
                .find_map(|key| self.configs.get(*key)),
        }
    }

    /// Encode as an `X-Registry-Config` header value.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Parse` if serialisation fails.
    pub fn to_header_value(&self) -> Result<String, EngineError> {
        encode_header(self)
    }
}

impl From<BTreeMap<String, AuthConfig>> for AuthConfigs {
    fn from(configs: BTreeMap<String, AuthConfig>) -> Self {
        Self { configs }
    }
}

fn encode_header<T: Serialize>(value: &T) -> Result<String, EngineError> {
    let json = serde_json::to_vec(value).map_err(|e| EngineError::Parse {
        message: format!("failed to encode registry credentials: {e}"),
    })?;
    Ok(URL_SAFE.encode(json))
}
