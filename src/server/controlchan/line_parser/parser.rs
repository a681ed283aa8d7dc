use super::error::{ParseErrorKind, Result};
use crate::server::controlchan::command::Command;

use std::str;

/// Parses one CRLF-terminated control-channel line into a [`Command`].
///
/// The text before the first space, uppercased, selects the verb; the rest
/// of the line, trimmed, is the argument. A verb that needs an argument but
/// did not get one yields an invalid-command error.
pub fn parse<T: AsRef<[u8]>>(line: T) -> Result<Command> {
    let line = str::from_utf8(line.as_ref())?.trim();
    let (verb, arg) = match line.find(' ') {
        Some(idx) => (&line[..idx], line[idx + 1..].trim()),
        None => (line, ""),
    };
    let verb = verb.to_uppercase();

    let cmd = match verb.as_str() {
        "USER" => Command::User {
            username: required(arg)?.to_string(),
        },
        "PASS" => Command::Pass {
            password: required(arg)?.to_string(),
        },
        "QUIT" => Command::Quit,
        "NOOP" => Command::Noop,
        "TYPE" => Command::Type {
            param: required(arg)?.to_uppercase(),
        },
        "STRU" => Command::Stru {
            param: required(arg)?.to_uppercase(),
        },
        "MODE" => Command::Mode {
            param: required(arg)?.to_uppercase(),
        },
        "SYST" => Command::Syst,
        "PWD" | "XPWD" => Command::Pwd,
        "CWD" | "XCWD" => Command::Cwd {
            path: required(arg)?.to_string(),
        },
        "CDUP" => Command::Cdup,
        "MKD" | "XMKD" => Command::Mkd {
            path: required(arg)?.to_string(),
        },
        "RMD" | "XRMD" => Command::Rmd {
            path: required(arg)?.to_string(),
        },
        "DELE" => Command::Dele {
            path: required(arg)?.to_string(),
        },
        "LIST" => Command::List { path: list_path(arg) },
        "NLST" => Command::Nlst { path: optional(arg) },
        "MLSD" => Command::Mlsd { path: optional(arg) },
        "MLST" => Command::Mlst { path: optional(arg) },
        "MDTM" => Command::Mdtm {
            path: required(arg)?.to_string(),
        },
        "SIZE" => Command::Size {
            path: required(arg)?.to_string(),
        },
        "STAT" => Command::Stat { path: optional(arg) },
        "RETR" => Command::Retr {
            path: required(arg)?.to_string(),
        },
        "STOR" => Command::Stor {
            path: required(arg)?.to_string(),
        },
        "STOU" => Command::Stou,
        "APPE" => Command::Appe {
            path: required(arg)?.to_string(),
        },
        "RNFR" => Command::Rnfr {
            path: required(arg)?.to_string(),
        },
        "RNTO" => Command::Rnto {
            path: required(arg)?.to_string(),
        },
        "PASV" => Command::Pasv,
        "PORT" => Command::Port {
            addr: required(arg)?.to_string(),
        },
        "EPSV" => Command::Epsv { param: optional(arg) },
        "EPRT" => Command::Eprt {
            addr: required(arg)?.to_string(),
        },
        "AUTH" => Command::Auth {
            protocol: required(arg)?.to_string(),
        },
        "PBSZ" => Command::Pbsz {
            size: required(arg)?.to_string(),
        },
        "PROT" => Command::Prot {
            param: required(arg)?.to_uppercase(),
        },
        "FEAT" => Command::Feat,
        "OPTS" => Command::Opts {
            option: required(arg)?.to_string(),
        },
        "LANG" => Command::Lang { lang: optional(arg) },
        "HELP" => Command::Help { topic: optional(arg) },
        "ABOR" => Command::Abor,
        "ACCT" => Command::Acct,
        "ALLO" => Command::Allo,
        "" => return Err(ParseErrorKind::InvalidCommand.into()),
        _ => {
            return Err(ParseErrorKind::UnknownCommand { command: verb }.into());
        }
    };
    Ok(cmd)
}

fn required(arg: &str) -> Result<&str> {
    if arg.is_empty() {
        return Err(ParseErrorKind::InvalidCommand.into());
    }
    Ok(arg)
}

fn optional(arg: &str) -> Option<String> {
    if arg.is_empty() {
        None
    } else {
        Some(arg.to_string())
    }
}

// LIST may carry `ls`-style flags; they are ignored and the first non-flag
// token, if any, is the path.
fn list_path(arg: &str) -> Option<String> {
    arg.split(' ')
        .filter(|tok| !tok.is_empty() && !tok.starts_with('-'))
        .map(|tok| tok.to_string())
        .next()
}
