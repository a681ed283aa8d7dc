//! The RFC 959 Change to Parent Directory (`CDUP`) command.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::vfs::clean;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Cdup;

#[async_trait]
impl CommandHandler for Cdup {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        if session.cwd == "/" {
            return Ok(Reply::new(ReplyCode::ResourceUnavailable, "Already at the root directory"));
        }
        session.cwd = clean(&format!("{}/..", session.cwd));
        Ok(Reply::new(ReplyCode::FileActionOkay, "Directory changed"))
    }
}
