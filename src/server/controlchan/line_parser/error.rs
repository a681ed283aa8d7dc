use thiserror::Error;

/// The error returned when a control-channel line cannot be parsed into a
/// command.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ParseError {
    kind: ParseErrorKind,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseErrorKind {
    /// The client sent a verb we know nothing about.
    #[error("unknown command: {command}")]
    UnknownCommand { command: String },

    /// A known verb with a missing or malformed argument.
    #[error("invalid command (invalid parameter)")]
    InvalidCommand,

    /// The line contains a non-UTF-8 byte sequence.
    #[error("non-UTF-8 character in command")]
    InvalidUtf8,
}

impl ParseError {
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl From<ParseErrorKind> for ParseError {
    fn from(kind: ParseErrorKind) -> ParseError {
        ParseError { kind }
    }
}

impl From<std::str::Utf8Error> for ParseError {
    fn from(_: std::str::Utf8Error) -> ParseError {
        ParseErrorKind::InvalidUtf8.into()
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
