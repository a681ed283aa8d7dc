//! The error type used by [`Server`](crate::Server).

use thiserror::Error;

/// Error returned by the serve and shutdown methods of
/// [`Server`](crate::Server).
#[derive(Debug, Error)]
pub enum ServerError {
    /// Returned by the serve methods after `close` or `shutdown` was
    /// called. Not a failure; it signals an orderly stop.
    #[error("ftp: server closed")]
    Closed,

    /// A listener or socket operation failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The shutdown grace period expired before all sessions finished.
    #[error("shutdown deadline exceeded")]
    ShutdownTimeout,
}
