use std::fmt::Display;

/// Converts a `Result` into an `Option`, logging the error on the way.
pub trait ResultOkLogExt<T, E> {
    /// Logs the error at `error` level, prefixed with `context`, and returns `None`.
    fn ok_log_with(self, context: impl Display) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log_with(self, context: impl Display) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{context}: {err}");
                None
            }
        }
    }
}
