//! The RFC 959 Transfer Mode (`MODE`) command. Only `S`tream is supported.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Mode {
    param: String,
}

impl Mode {
    pub fn new(param: String) -> Self {
        Mode { param }
    }
}

#[async_trait]
impl CommandHandler for Mode {
    async fn handle(&self, _session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        match self.param.as_str() {
            "S" => Ok(Reply::new(ReplyCode::CommandOkay, "Mode set to Stream")),
            _ => Ok(Reply::new(ReplyCode::CommandNotImplementedForParameter, "Mode not supported")),
        }
    }
}
