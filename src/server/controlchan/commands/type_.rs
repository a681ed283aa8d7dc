//! The RFC 959 Representation Type (`TYPE`) command.
//
// Only ASCII and Image are accepted, and both behave as binary; this server
// never performs ASCII translation.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Type {
    param: String,
}

impl Type {
    pub fn new(param: String) -> Self {
        Type { param }
    }
}

#[async_trait]
impl CommandHandler for Type {
    async fn handle(&self, _session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        match self.param.as_str() {
            "A" | "I" => Ok(Reply::new_with_string(ReplyCode::CommandOkay, format!("Type set to {}", self.param))),
            _ => Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Unsupported type")),
        }
    }
}
