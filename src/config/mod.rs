//! Startup configuration: daemon endpoint, TLS material and the ordered list of outputs.
use std::collections::HashSet;
use std::path::Path;

mod error;
mod file;
mod output;
mod signal;
mod tls;

pub use error::{Error, Result};
pub use output::OutputConfig;
pub use signal::Signal;
pub use tls::TlsConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub endpoint: Option<String>,
    pub tls: TlsConfig,
    pub outputs: Vec<OutputConfig>,
}

impl GeneratorConfig {
    /// Appends the outputs of a TOML config file.
    ///
    /// An `endpoint` or `[tls]` table in the file replaces the current value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] or [`Error::Parse`] if the file cannot be loaded.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = file::ConfigFile::read(path)?;
        log::debug!(
            "Loaded {} output(s) from `{}`",
            file.config.len(),
            path.display()
        );
        if file.endpoint.is_some() {
            self.endpoint = file.endpoint;
        }
        if let Some(tls) = file.tls {
            self.tls = tls;
        }
        self.outputs.extend(file.config);
        Ok(())
    }

    /// # Errors
    ///
    /// - [`Error::NoOutputs`] if no output is configured.
    /// - [`Error::MissingTemplate`] if an output has an empty template path.
    /// - [`Error::DuplicateDest`] if two outputs write to the same destination.
    ///
    /// TLS material is only checked once the endpoint turns out to be TCP, since Unix sockets
    /// ignore it.
    pub fn validate(&self) -> Result<()> {
        if self.outputs.is_empty() {
            return Err(Error::NoOutputs);
        }
        let mut seen = HashSet::with_capacity(self.outputs.len());
        for (index, output) in self.outputs.iter().enumerate() {
            if output.template.as_os_str().is_empty() {
                return Err(Error::MissingTemplate { index });
            }
            if let Some(dest) = &output.dest {
                if !seen.insert(dest) {
                    return Err(Error::DuplicateDest(dest.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn has_watched_outputs(&self) -> bool {
        self.outputs.iter().any(|o| o.watch)
    }
}
