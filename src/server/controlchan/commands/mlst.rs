//! The RFC 3659 Machine Listing (`MLST`) command, replying over the control
//! channel.

use super::{format_facts, vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use crate::vfs::Vfs;

use async_trait::async_trait;

#[derive(Debug)]
pub struct Mlst {
    path: Option<String>,
}

impl Mlst {
    pub fn new(path: Option<String>) -> Self {
        Mlst { path }
    }
}

#[async_trait]
impl CommandHandler for Mlst {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let path = match &self.path {
            Some(path) => session.resolve(path),
            None => session.cwd.clone(),
        };
        let fi = match fs.stat(&path).await {
            Ok(fi) => fi,
            Err(err) => return Ok(vfs_error_reply(&err)),
        };

        // The fact line is space-prefixed per RFC 3659 §7.2.
        Ok(Reply::new_multiline(
            ReplyCode::FileActionOkay,
            vec![
                format!("Listing {}", path),
                format!(" {}", format_facts(&fi, &path)),
                "End".to_string(),
            ],
        ))
    }
}
