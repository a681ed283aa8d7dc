//! The RFC 959 Logout (`QUIT`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Quit;

#[async_trait]
impl CommandHandler for Quit {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        session.closing = true;
        Ok(Reply::new(ReplyCode::ClosingControlConnection, "Good bye."))
    }
}
