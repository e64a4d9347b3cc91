use std::fmt::Display;

/// Turns an error into a log line at the point where it is contained.
pub trait ResultLogExt<T> {
    /// Logs the error prefixed with `context` and discards it.
    fn log_err(self, context: impl Display) -> Option<T>;
}

impl<T, E> ResultLogExt<T> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn log_err(self, context: impl Display) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{context}: {err}");
                None
            }
        }
    }
}
