//! The RFC 959 Delete (`DELE`) command.

use super::{vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::vfs::{Vfs, VfsError};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Dele {
    path: String,
}

impl Dele {
    pub fn new(path: String) -> Self {
        Dele { path }
    }
}

#[async_trait]
impl CommandHandler for Dele {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let path = session.resolve(&self.path);
        match fs.remove(&path).await {
            Ok(()) => Ok(Reply::new(ReplyCode::CommandOkay, "File removed")),
            Err(VfsError::NotFound) => Ok(Reply::new(ReplyCode::ResourceUnavailable, "No such file")),
            Err(err) => Ok(vfs_error_reply(&err)),
        }
    }
}
