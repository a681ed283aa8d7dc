//! The RFC 2428 Extended Data Port (`EPRT`) command.

use super::port::open_active_transfer;
use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

#[derive(Debug)]
pub struct Eprt {
    addr: String,
}

impl Eprt {
    pub fn new(addr: String) -> Self {
        Eprt { addr }
    }
}

// <d><proto><d><addr><d><port><d>, where <d> is the first byte of the
// argument and proto is 1 (IPv4) or 2 (IPv6).
fn parse_eprt(arg: &str) -> Option<SocketAddr> {
    let delim = arg.chars().next()?;
    let mut fields = arg[delim.len_utf8()..].split(delim);
    let proto = fields.next()?;
    let addr = fields.next()?;
    let port: u16 = fields.next()?.parse().ok()?;

    let ip: IpAddr = match proto {
        "1" => IpAddr::V4(addr.parse::<Ipv4Addr>().ok()?),
        "2" => IpAddr::V6(addr.parse::<Ipv6Addr>().ok()?),
        _ => return None,
    };
    Some(SocketAddr::new(ip, port))
}

#[async_trait]
impl CommandHandler for Eprt {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        if session.epsv_all {
            return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "EPRT not allowed after EPSV ALL"));
        }
        if !session.server.enable_active_mode {
            return Ok(Reply::new(ReplyCode::CommandNotImplemented, "Active mode is disabled"));
        }
        let addr = match parse_eprt(&self.addr) {
            Some(addr) => addr,
            None => return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Illegal EPRT command")),
        };
        Ok(open_active_transfer(session, addr).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_protocols() {
        assert_eq!(parse_eprt("|1|192.0.2.7|2048|"), Some("192.0.2.7:2048".parse().unwrap()));
        assert_eq!(parse_eprt("|2|2001:db8::1|2048|"), Some("[2001:db8::1]:2048".parse().unwrap()));
        // Any delimiter byte works.
        assert_eq!(parse_eprt("!1!192.0.2.7!2048!"), Some("192.0.2.7:2048".parse().unwrap()));
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert_eq!(parse_eprt(""), None);
        assert_eq!(parse_eprt("|3|192.0.2.7|2048|"), None);
        assert_eq!(parse_eprt("|1|2001:db8::1|2048|"), None);
        assert_eq!(parse_eprt("|1|192.0.2.7|notaport|"), None);
    }
}
