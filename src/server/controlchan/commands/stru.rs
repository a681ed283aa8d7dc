//! The RFC 959 File Structure (`STRU`) command. Only `F`ile is supported.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Stru {
    param: String,
}

impl Stru {
    pub fn new(param: String) -> Self {
        Stru { param }
    }
}

#[async_trait]
impl CommandHandler for Stru {
    async fn handle(&self, _session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        match self.param.as_str() {
            "F" => Ok(Reply::new(ReplyCode::CommandOkay, "Structure set to File")),
            _ => Ok(Reply::new(ReplyCode::CommandNotImplementedForParameter, "Structure not supported")),
        }
    }
}
