//! The RFC 959 Abort (`ABOR`) command.
//
// Transfers run on the session task, so by the time ABOR is read any
// transfer has already finished or failed; all that remains is to drop the
// pending data transfer, if one was set up.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Abor;

#[async_trait]
impl CommandHandler for Abor {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        session.dt.close();
        Ok(Reply::new(ReplyCode::ClosingDataConnection, "Closing data connection."))
    }
}
