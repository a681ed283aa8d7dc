//! The RFC 2228 Protection Buffer Size (`PBSZ`) command.
//
// TLS does not use protection buffers, so the only meaningful size is 0.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Pbsz {
    size: String,
}

impl Pbsz {
    pub fn new(size: String) -> Self {
        Pbsz { size }
    }
}

#[async_trait]
impl CommandHandler for Pbsz {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        if !session.cmd_tls {
            return Ok(Reply::new(ReplyCode::FileError, "PBSZ requires a TLS control connection"));
        }
        match self.size.as_str() {
            "0" => Ok(Reply::new(ReplyCode::CommandOkay, "PBSZ=0")),
            _ => Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Only PBSZ 0 is supported")),
        }
    }
}
