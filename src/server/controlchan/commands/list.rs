//! The RFC 959 List (`LIST`) command.

use super::{send_listing, vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use crate::vfs::Vfs;

use async_trait::async_trait;

#[derive(Debug)]
pub struct List {
    path: Option<String>,
}

impl List {
    pub fn new(path: Option<String>) -> Self {
        List { path }
    }
}

#[async_trait]
impl CommandHandler for List {
    async fn handle(&self, session: &mut Session, control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let path = match &self.path {
            Some(path) => session.resolve(path),
            None => session.cwd.clone(),
        };
        let entries = match fs.read_dir(&path).await {
            Ok(entries) => entries,
            Err(err) => return Ok(vfs_error_reply(&err)),
        };

        let mut payload = String::new();
        for fi in &entries {
            payload.push_str(&format!("{}\r\n", fi));
        }
        send_listing(session, control, payload.into_bytes()).await
    }
}
