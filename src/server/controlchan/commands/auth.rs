//! The RFC 2228 Authentication/Security Mechanism (`AUTH`) command.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Auth {
    protocol: String,
}

impl Auth {
    pub fn new(protocol: String) -> Self {
        Auth { protocol }
    }
}

#[async_trait]
impl CommandHandler for Auth {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        if !self.protocol.eq_ignore_ascii_case("tls") {
            return Ok(Reply::new(ReplyCode::CommandNotImplementedForParameter, "Unsupported security mechanism"));
        }
        if session.cmd_tls {
            return Ok(Reply::new(ReplyCode::BadCommandSequence, "Already using TLS"));
        }
        if session.server.tls_config.is_none() {
            return Ok(Reply::new(ReplyCode::CommandNotImplemented, "TLS is not configured"));
        }
        // The control loop performs the handshake once this reply has been
        // written in plaintext.
        session.upgrade_tls = true;
        Ok(Reply::new(ReplyCode::AuthOkayNoDataNeeded, "AUTH TLS successful"))
    }
}
