//! The RFC 3659 File Size (`SIZE`) command.

use super::{vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use crate::vfs::Vfs;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Size {
    path: String,
}

impl Size {
    pub fn new(path: String) -> Self {
        Size { path }
    }
}

#[async_trait]
impl CommandHandler for Size {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let path = session.resolve(&self.path);
        match fs.stat(&path).await {
            Ok(fi) if fi.is_dir => Ok(Reply::new(ReplyCode::FileError, "Not a regular file")),
            Ok(fi) => Ok(Reply::new_with_string(ReplyCode::FileStatus, fi.size.to_string())),
            Err(err) => Ok(vfs_error_reply(&err)),
        }
    }
}
