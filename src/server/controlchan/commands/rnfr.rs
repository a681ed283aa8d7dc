//! The RFC 959 Rename From (`RNFR`) command.

use super::{vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::session::RenameSource;

use crate::vfs::Vfs;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Rnfr {
    path: String,
}

impl Rnfr {
    pub fn new(path: String) -> Self {
        Rnfr { path }
    }
}

#[async_trait]
impl CommandHandler for Rnfr {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        if session.rename_from.is_some() {
            return Ok(Reply::new(ReplyCode::BadCommandSequence, "RNFR already issued"));
        }
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let path = session.resolve(&self.path);
        match fs.open(&path).await {
            Ok(reader) => {
                session.rename_from = Some(RenameSource { path, reader });
                Ok(Reply::new(ReplyCode::FileActionPending, "Ready for destination name"))
            }
            Err(err) => Ok(vfs_error_reply(&err)),
        }
    }
}
