//! The RFC 959 Change Working Directory (`CWD`) command.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use crate::vfs::Vfs;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Cwd {
    path: String,
}

impl Cwd {
    pub fn new(path: String) -> Self {
        Cwd { path }
    }
}

#[async_trait]
impl CommandHandler for Cwd {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let path = session.resolve(&self.path);
        match fs.stat(&path).await {
            Ok(fi) if fi.is_dir => {
                session.cwd = path;
                Ok(Reply::new(ReplyCode::FileActionOkay, "Directory changed"))
            }
            _ => Ok(Reply::new(ReplyCode::ResourceUnavailable, "Failed to change directory")),
        }
    }
}
