//! The per-connection control loop: greeting, command dispatch, TLS
//! upgrade and shutdown handling.

use super::command::Command;
use super::commands;
use super::handler::CommandHandler;
use super::line_parser::ParseErrorKind;
use super::{telnet_framed, BoxedIo, ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::ftpserver::ServerState;
use crate::server::session::Session;
use crate::server::shutdown;

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

// Every handler is bounded; a wedged data transfer must not pin the session
// forever.
const HANDLER_TIMEOUT: Duration = Duration::from_secs(60);

/// Takes over a freshly accepted control connection and runs its session on
/// a new task.
pub(crate) async fn spawn_loop(state: Arc<ServerState>, tcp: TcpStream, implicit_tls: bool, shutdown: shutdown::Listener) {
    tokio::spawn(run(state, tcp, implicit_tls, shutdown));
}

async fn run(state: Arc<ServerState>, tcp: TcpStream, implicit_tls: bool, mut shutdown: shutdown::Listener) {
    let (peer_addr, local_addr) = match (tcp.peer_addr(), tcp.local_addr()) {
        (Ok(peer), Ok(local)) => (peer, local),
        _ => return,
    };

    let io: BoxedIo = if implicit_tls {
        let config = match &state.tls_config {
            Some(config) => Arc::clone(config),
            None => {
                slog::error!(state.logger, "implicit TLS listener without TLS configuration");
                return;
            }
        };
        match TlsAcceptor::from(config).accept(tcp).await {
            Ok(stream) => Box::new(stream),
            Err(err) => {
                slog::warn!(state.logger, "TLS handshake failed: {}", err; "peer" => %peer_addr);
                return;
            }
        }
    } else {
        Box::new(tcp)
    };

    let root_logger = state.logger.clone();
    let mut session = Session::new(state, peer_addr, local_addr, implicit_tls, root_logger);
    let logger = session.logger.clone();
    let mut control: ControlStream = telnet_framed(io);

    let greeting = session.server.greeting.clone();
    if control.send(Reply::new(ReplyCode::ServiceReady, &greeting)).await.is_err() {
        return;
    }
    slog::info!(logger, "control connection opened");

    loop {
        if session.closing {
            break;
        }
        let incoming = tokio::select! {
            item = control.next() => match item {
                None => break,
                Some(item) => item,
            },
            _ = shutdown.listen() => {
                let _ = control
                    .send(Reply::new(ReplyCode::ServiceNotAvailable, "Service not available, closing control connection"))
                    .await;
                break;
            }
        };

        match incoming {
            Ok(cmd) => {
                slog::debug!(logger, "command received"; "verb" => cmd.verb());
                if session.auth.is_none() && !cmd.is_exempt_from_auth() {
                    if control.send(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")).await.is_err() {
                        break;
                    }
                    continue;
                }

                let handler = dispatch(cmd);
                let reply = match tokio::time::timeout(HANDLER_TIMEOUT, handler.handle(&mut session, &mut control)).await {
                    Ok(Ok(reply)) => reply,
                    Ok(Err(ControlChanError::Io(err))) => {
                        slog::warn!(logger, "i/o error while handling command: {}", err);
                        break;
                    }
                    Ok(Err(err)) => {
                        slog::warn!(logger, "error while handling command: {}", err);
                        Reply::new(ReplyCode::LocalError, "Requested action aborted, local error in processing")
                    }
                    Err(_elapsed) => {
                        session.dt.close();
                        Reply::new(ReplyCode::LocalError, "Command timed out")
                    }
                };
                if control.send(reply).await.is_err() {
                    break;
                }

                if session.upgrade_tls {
                    session.upgrade_tls = false;
                    let config = match &session.server.tls_config {
                        Some(config) => Arc::clone(config),
                        None => break,
                    };
                    // The 234 went out in plaintext; now redo the whole
                    // stack on top of the TLS stream.
                    let io = control.into_inner().into_inner();
                    control = match TlsAcceptor::from(config).accept(io).await {
                        Ok(stream) => telnet_framed(Box::new(stream) as BoxedIo),
                        Err(err) => {
                            slog::warn!(logger, "TLS upgrade failed: {}", err);
                            break;
                        }
                    };
                    session.cmd_tls = true;
                    slog::info!(logger, "control channel upgraded to TLS");
                }
            }
            Err(err) => {
                let (reply, close) = error_reply(&err);
                slog::debug!(logger, "rejecting bad command line: {}", err);
                if control.send(reply).await.is_err() {
                    break;
                }
                if close {
                    break;
                }
            }
        }
    }

    // Closing the transfer here releases any outstanding passive port
    // lease, whatever path ended the loop.
    session.dt.close();
    slog::info!(logger, "control connection closed");
}

// Maps a control-channel error to the reply sent to the client, and tells
// whether the session should end.
fn error_reply(err: &ControlChanError) -> (Reply, bool) {
    match err {
        ControlChanError::Parse(parse) => match parse.kind() {
            ParseErrorKind::UnknownCommand { .. } => (Reply::new(ReplyCode::CommandSyntaxError, "Command not found"), false),
            ParseErrorKind::InvalidCommand => (
                Reply::new(ReplyCode::ParameterSyntaxError, "Action aborted, required param missing"),
                false,
            ),
            ParseErrorKind::InvalidUtf8 => (Reply::new(ReplyCode::CommandSyntaxError, "Invalid UTF-8 in command"), true),
        },
        ControlChanError::Io(_) => (Reply::none(), true),
    }
}

fn dispatch(cmd: Command) -> Box<dyn CommandHandler> {
    match cmd {
        Command::User { username } => Box::new(commands::User::new(username)),
        Command::Pass { password } => Box::new(commands::Pass::new(password)),
        Command::Quit => Box::new(commands::Quit),
        Command::Noop => Box::new(commands::Noop),
        Command::Type { param } => Box::new(commands::Type::new(param)),
        Command::Stru { param } => Box::new(commands::Stru::new(param)),
        Command::Mode { param } => Box::new(commands::Mode::new(param)),
        Command::Syst => Box::new(commands::Syst),
        Command::Pwd => Box::new(commands::Pwd),
        Command::Cwd { path } => Box::new(commands::Cwd::new(path)),
        Command::Cdup => Box::new(commands::Cdup),
        Command::Mkd { path } => Box::new(commands::Mkd::new(path)),
        Command::Rmd { path } => Box::new(commands::Rmd::new(path)),
        Command::Dele { path } => Box::new(commands::Dele::new(path)),
        Command::List { path } => Box::new(commands::List::new(path)),
        Command::Nlst { path } => Box::new(commands::Nlst::new(path)),
        Command::Mlsd { path } => Box::new(commands::Mlsd::new(path)),
        Command::Mlst { path } => Box::new(commands::Mlst::new(path)),
        Command::Mdtm { path } => Box::new(commands::Mdtm::new(path)),
        Command::Size { path } => Box::new(commands::Size::new(path)),
        Command::Stat { path } => Box::new(commands::Stat::new(path)),
        Command::Retr { path } => Box::new(commands::Retr::new(path)),
        Command::Stor { path } => Box::new(commands::Stor::new(path)),
        Command::Stou => Box::new(commands::Stou),
        Command::Appe { path } => Box::new(commands::Appe::new(path)),
        Command::Rnfr { path } => Box::new(commands::Rnfr::new(path)),
        Command::Rnto { path } => Box::new(commands::Rnto::new(path)),
        Command::Pasv => Box::new(commands::Pasv),
        Command::Port { addr } => Box::new(commands::Port::new(addr)),
        Command::Epsv { param } => Box::new(commands::Epsv::new(param)),
        Command::Eprt { addr } => Box::new(commands::Eprt::new(addr)),
        Command::Auth { protocol } => Box::new(commands::Auth::new(protocol)),
        Command::Pbsz { size } => Box::new(commands::Pbsz::new(size)),
        Command::Prot { param } => Box::new(commands::Prot::new(param)),
        Command::Feat => Box::new(commands::Feat),
        Command::Opts { option } => Box::new(commands::Opts::new(option)),
        Command::Lang { lang } => Box::new(commands::Lang::new(lang)),
        Command::Help { topic } => Box::new(commands::Help::new(topic)),
        Command::Abor => Box::new(commands::Abor),
        Command::Acct => Box::new(commands::Acct),
        Command::Allo => Box::new(commands::Allo),
    }
}
