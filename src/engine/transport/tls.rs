//! TLS client configuration for `https://` endpoints.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::{ClientConfig, RootCertStore};

use crate::error::EngineError;

/// Locations of the PEM files used to authenticate against a TLS daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    /// CA bundle that signed the daemon certificate.
    pub ca_cert: Utf8PathBuf,
    /// Client certificate chain.
    pub client_cert: Utf8PathBuf,
    /// Client private key.
    pub client_key: Utf8PathBuf,
}

impl TlsSettings {
    /// Settings for a directory laid out like `DOCKER_CERT_PATH`
    /// (`ca.pem`, `cert.pem`, `key.pem`).
    #[must_use]
    pub fn from_cert_dir(dir: &Utf8Path) -> Self {
        Self {
            ca_cert: dir.join("ca.pem"),
            client_cert: dir.join("cert.pem"),
            client_key: dir.join("key.pem"),
        }
    }

    /// Load the PEM files and build a rustls client configuration.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Tls` when a file cannot be read, holds no usable
    /// PEM data, or the key does not match the certificate.
    pub fn client_config(&self) -> Result<Arc<ClientConfig>, EngineError> {
        let mut roots = RootCertStore::empty();
        for cert in read_certificates(&self.ca_cert)? {
            roots
                .add(cert)
                .map_err(|e| tls_error(format!("invalid CA certificate {}: {e}", self.ca_cert)))?;
        }

        let chain = read_certificates(&self.client_cert)?;
        let key_pem = read_pem(&self.client_key)?;
        let key = PrivateKeyDer::from_pem_slice(&key_pem)
            .map_err(|e| tls_error(format!("invalid private key {}: {e}", self.client_key)))?;

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| tls_error(e.to_string()))?
            .with_root_certificates(roots)
            .with_client_auth_cert(chain, key)
            .map_err(|e| tls_error(e.to_string()))?;
        Ok(Arc::new(config))
    }
}

fn read_certificates(path: &Utf8Path) -> Result<Vec<CertificateDer<'static>>, EngineError> {
    let pem = read_pem(path)?;
    let certs = CertificateDer::pem_slice_iter(&pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| tls_error(format!("invalid certificate {path}: {e}")))?;
    if certs.is_empty() {
        return Err(tls_error(format!("no certificates found in {path}")));
    }
    Ok(certs)
}

/// Read a PEM file through a capability handle on its parent directory.
fn read_pem(path: &Utf8Path) -> Result<Vec<u8>, EngineError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| tls_error(format!("not a file path: {path}")))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|e| tls_error(format!("failed to open directory {parent}: {e}")))?;
    dir.read(file_name)
        .map_err(|e| tls_error(format!("failed to read {path}: {e}")))
}

fn tls_error(message: impl Into<String>) -> EngineError {
    EngineError::Tls {
        message: message.into(),
    }
}
