use std::path::Path;

use super::{Error, OutputConfig, Result, TlsConfig};

/// On-disk TOML layout. Each `[[config]]` table is one output.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ConfigFile {
    pub endpoint: Option<String>,
    pub tls: Option<TlsConfig>,
    #[serde(default)]
    pub config: Vec<OutputConfig>,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
