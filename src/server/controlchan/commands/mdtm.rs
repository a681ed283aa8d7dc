//! The RFC 3659 Modification Time (`MDTM`) command.

use super::{vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use crate::vfs::Vfs;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Mdtm {
    path: String,
}

impl Mdtm {
    pub fn new(path: String) -> Self {
        Mdtm { path }
    }
}

#[async_trait]
impl CommandHandler for Mdtm {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let path = session.resolve(&self.path);
        match fs.stat(&path).await {
            Ok(fi) => Ok(Reply::new_with_string(
                ReplyCode::FileStatus,
                fi.modified.format("%Y%m%d%H%M%S%.3f").to_string(),
            )),
            Err(err) => Ok(vfs_error_reply(&err)),
        }
    }
}
