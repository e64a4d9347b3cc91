#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to create docker client: {0}")]
    Connect(#[source] crate::docker::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
