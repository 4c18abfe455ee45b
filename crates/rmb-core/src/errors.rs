/// Core error type for the reminder bot.
///
/// Adapter crates map their specific errors into this type so the delivery
/// loop can decide between cooling down and moving on via [`Error::kind`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("programming error: {0}")]
    Programming(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("callback data is {len} bytes, limit is {max}")]
    CallbackDataTooLong { len: usize, max: usize },

    #[error("invalid callback data: {0:?}")]
    InvalidCallbackData(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by the failure policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Validation,
    NotFound,
    Programming,
    Cancelled,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Transport,
            Error::Validation(_) | Error::CallbackDataTooLong { .. } => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Programming(_) => ErrorKind::Programming,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Config(_)
            | Error::InvalidCallbackData(_)
            | Error::Storage(_)
            | Error::Pool(_)
            | Error::Io(_)
            | Error::Internal(_) => ErrorKind::Other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors_for_the_policy() {
        assert_eq!(Error::Transport("x".into()).kind(), ErrorKind::Transport);
        assert_eq!(Error::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(
            Error::CallbackDataTooLong { len: 70, max: 64 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::Programming("x".into()).kind(), ErrorKind::Programming);
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(Error::Internal("boom".into()).kind(), ErrorKind::Other);
    }
}
