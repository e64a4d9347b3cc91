#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to run notify command `{cmd}`: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to collect output of notify command `{cmd}`: {source}")]
    Output {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
    #[error("notify command `{cmd}` exited with {status}: {output}")]
    Failed {
        cmd: String,
        status: std::process::ExitStatus,
        output: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
