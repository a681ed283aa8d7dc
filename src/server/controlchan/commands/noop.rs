//! The RFC 959 No Operation (`NOOP`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Noop;

#[async_trait]
impl CommandHandler for Noop {
    async fn handle(&self, _session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        Ok(Reply::new(ReplyCode::CommandOkay, "Okay."))
    }
}
