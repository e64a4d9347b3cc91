use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid daemon endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint {
        endpoint: String,
        reason: &'static str,
    },
    #[error("failed to load TLS material `{path}`: {source}")]
    TlsMaterial {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no private key found in `{0}`")]
    MissingPrivateKey(PathBuf),
    #[error("invalid TLS setup: {0}")]
    TlsSetup(#[source] rustls::Error),
    #[error("`{0}` is not a valid TLS server name")]
    InvalidServerName(String),
    #[error(transparent)]
    Config(#[from] crate::config::Error),
    #[error("failed to connect to docker daemon at `{endpoint}`: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP handshake with docker daemon failed: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("failed to build request for `{path}`: {source}")]
    BuildRequest {
        path: String,
        #[source]
        source: hyper::http::Error,
    },
    #[error("request `{path}` failed: {source}")]
    Request {
        path: String,
        #[source]
        source: hyper::Error,
    },
    #[error("docker daemon answered `{path}` with status {status}: {message}")]
    Api {
        path: String,
        status: u16,
        message: String,
    },
    #[error("docker daemon did not answer `{path}` within {after:?}")]
    Timeout { path: String, after: Duration },
    #[error("failed to decode response of `{path}`: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Container(#[from] crate::container::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
