//! The RFC 959 Make Directory (`MKD`) command.

use super::{vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::vfs::{Vfs, VfsError};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Mkd {
    path: String,
}

impl Mkd {
    pub fn new(path: String) -> Self {
        Mkd { path }
    }
}

#[async_trait]
impl CommandHandler for Mkd {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let path = session.resolve(&self.path);
        match fs.mkdir(&path).await {
            Ok(()) => {
                let quoted = path.replace('"', "\"\"");
                Ok(Reply::new_with_string(
                    ReplyCode::DirCreated,
                    format!("\"{}\" directory created.", quoted),
                ))
            }
            Err(VfsError::AlreadyExists) => Ok(Reply::new(ReplyCode::DirectoryExists, "Directory already exists")),
            Err(err) => Ok(vfs_error_reply(&err)),
        }
    }
}
