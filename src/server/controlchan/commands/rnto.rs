//! The RFC 959 Rename To (`RNTO`) command.
//
// The object store cannot rename in place, so the stashed reader from RNFR
// is written to the new path and the old path is removed afterwards.

use super::{vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use crate::vfs::Vfs;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Rnto {
    path: String,
}

impl Rnto {
    pub fn new(path: String) -> Self {
        Rnto { path }
    }
}

#[async_trait]
impl CommandHandler for Rnto {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let source = match session.rename_from.take() {
            Some(source) => source,
            None => return Ok(Reply::new(ReplyCode::BadCommandSequence, "Send RNFR first")),
        };
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let new_path = session.resolve(&self.path);

        let mut reader = source.reader;
        if let Err(err) = fs.create(&new_path, &mut reader).await {
            return Ok(vfs_error_reply(&err));
        }
        if let Err(err) = fs.remove(&source.path).await {
            return Ok(vfs_error_reply(&err));
        }
        Ok(Reply::new(ReplyCode::FileActionOkay, "File renamed"))
    }
}
