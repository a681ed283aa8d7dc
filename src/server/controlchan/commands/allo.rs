//! The RFC 959 Allocate (`ALLO`) command.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Allo;

#[async_trait]
impl CommandHandler for Allo {
    async fn handle(&self, _session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        Ok(Reply::new(ReplyCode::CommandOkayNotImplemented, "Superfluous at this site"))
    }
}
