use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid signal `{0}`")]
    InvalidSignal(String),
    #[error("output #{index} has no template")]
    MissingTemplate { index: usize },
    #[error("destination `{0}` is used by more than one output")]
    DuplicateDest(PathBuf),
    #[error("no outputs configured: pass a template or at least one --config file")]
    NoOutputs,
    #[error("TLS verification was requested, but CA cert `{0}` does not exist")]
    MissingCaCert(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
