use std::path::{Path, PathBuf};

use super::{Error, Result};

/// TLS material for a TCP daemon endpoint.
///
/// Passed explicitly to connection construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TlsConfig {
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub ca_cert: Option<PathBuf>,
    pub verify: bool,
}

impl TlsConfig {
    /// TLS is in use when verification is requested or any of the referenced files exists.
    pub fn is_enabled(&self) -> bool {
        self.verify
            || self.cert_file().is_some()
            || self.key_file().is_some()
            || self.ca_cert_file().is_some()
    }

    /// The client certificate, if configured and present on disk.
    pub fn cert_file(&self) -> Option<&Path> {
        existing(&self.cert)
    }

    pub fn key_file(&self) -> Option<&Path> {
        existing(&self.key)
    }

    /// The CA bundle the daemon certificate is verified against, if configured and present.
    pub fn ca_cert_file(&self) -> Option<&Path> {
        existing(&self.ca_cert)
    }

    /// # Errors
    ///
    /// Returns [`Error::MissingCaCert`] if verification is requested without an existing CA cert.
    pub fn validate(&self) -> Result<()> {
        if !self.verify {
            return Ok(());
        }
        match (self.ca_cert_file(), &self.ca_cert) {
            (Some(_), _) => Ok(()),
            (None, Some(ca)) => Err(Error::MissingCaCert(ca.clone())),
            (None, None) => Err(Error::MissingCaCert(PathBuf::new())),
        }
    }
}

fn existing(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| p.try_exists().unwrap_or(false))
}
