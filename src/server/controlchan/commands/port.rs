//! The RFC 959 Data Port (`PORT`) command.
//
// Active mode is off by default; it lets a client direct the server at
// arbitrary endpoints, which is the classic FTP bounce attack. When it is
// enabled, the endpoint must match the control peer and use an
// unprivileged port.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::datachan::{canonical_ip, ActiveTransfer, DataTransfer};

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug)]
pub struct Port {
    addr: String,
}

impl Port {
    pub fn new(addr: String) -> Self {
        Port { addr }
    }
}

// h1,h2,h3,h4,p1,p2
fn parse_host_port(arg: &str) -> Option<SocketAddr> {
    let mut nums = [0u8; 6];
    let mut count = 0;
    for part in arg.split(',') {
        if count == 6 {
            return None;
        }
        nums[count] = part.trim().parse().ok()?;
        count += 1;
    }
    if count != 6 {
        return None;
    }
    let ip = Ipv4Addr::new(nums[0], nums[1], nums[2], nums[3]);
    let port = u16::from(nums[4]) << 8 | u16::from(nums[5]);
    Some(SocketAddr::new(IpAddr::V4(ip), port))
}

// Checks and dialing shared with EPRT.
pub(super) async fn open_active_transfer(session: &mut Session, addr: SocketAddr) -> Reply {
    if addr.port() < 1024 {
        return Reply::new(ReplyCode::CommandNotImplementedForParameter, "Privileged data ports are not allowed");
    }
    if session.server.enable_address_check && canonical_ip(addr.ip()) != canonical_ip(session.peer_addr.ip()) {
        return Reply::new(ReplyCode::ParameterSyntaxError, "Data connection address must match the control peer");
    }

    match ActiveTransfer::dial(addr, session.data_tls()).await {
        Ok(transfer) => {
            session.set_data_transfer(DataTransfer::Active(transfer));
            Reply::new(ReplyCode::CommandOkay, "Okay.")
        }
        Err(err) => {
            slog::warn!(session.logger, "could not dial active data connection: {}", err; "addr" => %addr);
            Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection")
        }
    }
}

#[async_trait]
impl CommandHandler for Port {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        if session.epsv_all {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "PORT not allowed after EPSV ALL"));
        }
        if !session.server.enable_active_mode {
            return Ok(Reply::new(ReplyCode::CommandNotImplemented, "Active mode is disabled"));
        }
        let addr = match parse_host_port(&self.addr) {
            Some(addr) => addr,
            None => return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Illegal PORT command")),
        };
        Ok(open_active_transfer(session, addr).await)
    }
}
