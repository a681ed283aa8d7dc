//! The control-channel error type.

use super::line_parser::ParseError;

use thiserror::Error;

/// Errors surfaced by the control channel.
///
/// Parse errors are mapped to an FTP reply and the session continues; I/O
/// and TLS failures terminate the session.
#[derive(Debug, Error)]
pub enum ControlChanError {
    /// Failure reading from or writing to the control socket.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The client's command line could not be parsed.
    #[error("{0}")]
    Parse(#[from] ParseError),
}
