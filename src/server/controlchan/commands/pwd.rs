//! The RFC 959 Print Working Directory (`PWD`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::session::Session;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Pwd;

#[async_trait]
impl CommandHandler for Pwd {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        // Embedded quotes are doubled per RFC 959 appendix II.
        let quoted = session.cwd.replace('"', "\"\"");
        Ok(Reply::new_with_string(ReplyCode::DirCreated, format!("\"{}\"", quoted)))
    }
}
