//! The RFC 959 Status (`STAT`) command.

use super::{vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use crate::vfs::Vfs;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Stat {
    path: Option<String>,
}

impl Stat {
    pub fn new(path: Option<String>) -> Self {
        Stat { path }
    }
}

#[async_trait]
impl CommandHandler for Stat {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let path = match &self.path {
            None => return Ok(Reply::new(ReplyCode::SystemStatus, "Service status okay")),
            Some(path) => session.resolve(path),
        };
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        match fs.stat(&path).await {
            Ok(fi) => Ok(Reply::new_multiline(
                ReplyCode::FileStatus,
                vec!["Status follows:".to_string(), format!("{}", fi), "End of status".to_string()],
            )),
            Err(err) => Ok(vfs_error_reply(&err)),
        }
    }
}
