//! The RFC 959 Passive (`PASV`) command.
//
// The server listens on a leased port and tells the client where to
// connect. The advertised address is the first configured public IPv4, or
// the control connection's local address when none is configured; without
// any usable IPv4 the command is refused.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::datachan::{canonical_ip, DataTransfer, PassiveError, PassiveTransfer};

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};

#[derive(Debug)]
pub struct Pasv;

fn public_ipv4(session: &Session) -> Option<Ipv4Addr> {
    for ip in &session.server.public_ips {
        if let IpAddr::V4(v4) = canonical_ip(*ip) {
            return Some(v4);
        }
    }
    match canonical_ip(session.local_addr.ip()) {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(_) => None,
    }
}

#[async_trait]
impl CommandHandler for Pasv {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        if session.epsv_all {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "PASV not allowed after EPSV ALL"));
        }
        let ip = match public_ipv4(session) {
            Some(ip) => ip,
            None => return Ok(Reply::new(ReplyCode::CommandNotImplemented, "No public IPv4 address available")),
        };

        let transfer = PassiveTransfer::listen(
            &session.server.port_pool,
            session.peer_addr.ip(),
            session.server.enable_address_check,
            session.data_tls(),
            session.logger.clone(),
        )
        .await;
        let transfer = match transfer {
            Ok(transfer) => transfer,
            Err(PassiveError::Disabled) => {
                return Ok(Reply::new(ReplyCode::CommandNotImplemented, "Passive mode is disabled"));
            }
            Err(err) => {
                slog::warn!(session.logger, "could not set up passive transfer: {}", err);
                return Ok(Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection"));
            }
        };

        let port = transfer.port();
        session.set_data_transfer(DataTransfer::Passive(transfer));

        let octets = ip.octets();
        Ok(Reply::new_with_string(
            ReplyCode::EnteringPassiveMode,
            format!(
                "Entering Passive Mode ({},{},{},{},{},{})",
                octets[0],
                octets[1],
                octets[2],
                octets[3],
                port >> 8,
                port & 0xff
            ),
        ))
    }
}
