use super::error::ParseErrorKind;
use super::parse;
use crate::server::controlchan::command::Command;

use pretty_assertions::assert_eq;

#[test]
fn verbs_are_case_insensitive() {
    assert_eq!(
        parse(&b"user alice\r\n"[..]).unwrap(),
        Command::User {
            username: "alice".to_string()
        }
    );
    assert_eq!(
        parse(&b"UsEr bob\r\n"[..]).unwrap(),
        Command::User {
            username: "bob".to_string()
        }
    );
}

#[test]
fn arguments_are_trimmed() {
    assert_eq!(
        parse(&b"CWD   /some/dir  \r\n"[..]).unwrap(),
        Command::Cwd {
            path: "/some/dir".to_string()
        }
    );
}

#[test]
fn bare_verbs() {
    assert_eq!(parse(&b"QUIT\r\n"[..]).unwrap(), Command::Quit);
    assert_eq!(parse(&b"NOOP\r\n"[..]).unwrap(), Command::Noop);
    assert_eq!(parse(&b"SYST\r\n"[..]).unwrap(), Command::Syst);
    assert_eq!(parse(&b"PASV\r\n"[..]).unwrap(), Command::Pasv);
}

#[test]
fn missing_required_argument() {
    for line in ["USER\r\n", "RETR\r\n", "STOR\r\n", "CWD\r\n", "DELE \r\n"] {
        let err = parse(line.as_bytes()).unwrap_err();
        assert_eq!(*err.kind(), ParseErrorKind::InvalidCommand, "line {:?}", line);
    }
}

#[test]
fn unknown_command() {
    let err = parse(&b"BOGUS something\r\n"[..]).unwrap_err();
    assert_eq!(
        *err.kind(),
        ParseErrorKind::UnknownCommand {
            command: "BOGUS".to_string()
        }
    );
}

#[test]
fn non_utf8_line() {
    let err = parse(&b"RETR \xff\xfe\r\n"[..]).unwrap_err();
    assert_eq!(*err.kind(), ParseErrorKind::InvalidUtf8);
}

#[test]
fn list_ignores_flags() {
    assert_eq!(parse(&b"LIST -la\r\n"[..]).unwrap(), Command::List { path: None });
    assert_eq!(
        parse(&b"LIST -la /tmp\r\n"[..]).unwrap(),
        Command::List {
            path: Some("/tmp".to_string())
        }
    );
    assert_eq!(parse(&b"LIST\r\n"[..]).unwrap(), Command::List { path: None });
}

#[test]
fn epsv_parameters() {
    assert_eq!(parse(&b"EPSV\r\n"[..]).unwrap(), Command::Epsv { param: None });
    assert_eq!(
        parse(&b"EPSV ALL\r\n"[..]).unwrap(),
        Command::Epsv {
            param: Some("ALL".to_string())
        }
    );
}

#[test]
fn type_params_uppercased() {
    assert_eq!(parse(&b"TYPE i\r\n"[..]).unwrap(), Command::Type { param: "I".to_string() });
}
