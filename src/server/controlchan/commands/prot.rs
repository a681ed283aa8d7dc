//! The RFC 2228 Data Channel Protection Level (`PROT`) command.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::session::ProtectionLevel;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Prot {
    param: String,
}

impl Prot {
    pub fn new(param: String) -> Self {
        Prot { param }
    }
}

#[async_trait]
impl CommandHandler for Prot {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        match self.param.as_str() {
            "C" => {
                session.prot = ProtectionLevel::Clear;
                Ok(Reply::new(ReplyCode::CommandOkay, "Protection level set to Clear"))
            }
            "P" => {
                if !session.cmd_tls {
                    return Ok(Reply::new(ReplyCode::ProtLevelNotSupported, "PROT P requires a TLS control connection"));
                }
                session.prot = ProtectionLevel::Private;
                Ok(Reply::new(ReplyCode::CommandOkay, "Protection level set to Private"))
            }
            "S" | "E" => Ok(Reply::new(ReplyCode::ProtLevelNotSupported, "Protection level not supported")),
            _ => Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Unknown protection level")),
        }
    }
}
