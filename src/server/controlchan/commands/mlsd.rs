//! The RFC 3659 Machine Listing (`MLSD`) command.

use super::{format_facts, send_listing, vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use crate::vfs::Vfs;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Mlsd {
    path: Option<String>,
}

impl Mlsd {
    pub fn new(path: Option<String>) -> Self {
        Mlsd { path }
    }
}

#[async_trait]
impl CommandHandler for Mlsd {
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
            payload.push_str(&format_facts(fi, &fi.name));
            payload.push_str("\r\n");
        }
        send_listing(session, control, payload.into_bytes()).await
    }
}
