//! The RFC 959 Append (`APPE`) command.
//
// Implemented as read-old-then-overwrite: the existing content is opened
// first and the replacement object is written from its concatenation with
// the incoming data. Concurrent appenders can lose each other's data; the
// object store offers no atomic append to build on.

use super::{cant_open_data_connection, vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::vfs::{FileReader, Vfs, VfsError};

use async_trait::async_trait;
use futures_util::SinkExt;
use tokio::io::AsyncReadExt;

#[derive(Debug)]
pub struct Appe {
    path: String,
}

impl Appe {
    pub fn new(path: String) -> Self {
        Appe { path }
    }
}

#[async_trait]
impl CommandHandler for Appe {
    async fn handle(&self, session: &mut Session, control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let path = session.resolve(&self.path);

        // A missing file appends to empty content.
        let existing: FileReader = match fs.open(&path).await {
            Ok(reader) => reader,
            Err(VfsError::NotFound) => Box::new(tokio::io::empty()),
            Err(err) => return Ok(vfs_error_reply(&err)),
        };

        control.send(Reply::new(ReplyCode::FileStatusOkay, "Data transfer starting")).await?;

        let conn = match session.dt.take_conn().await {
            Ok(conn) => conn,
            Err(err) => {
                slog::warn!(session.logger, "could not open data connection: {}", err);
                session.dt.close();
                return Ok(cant_open_data_connection());
            }
        };

        let mut combined = existing.chain(conn);
        let stored = fs.create(&path, &mut combined).await;
        session.dt.close();

        match stored {
            Ok(n) => Ok(Reply::new_with_string(
                ReplyCode::ClosingDataConnection,
                format!("OK, received {} bytes.", n),
            )),
            Err(err) => {
                slog::warn!(session.logger, "append failed: {}", err; "path" => %path);
                Ok(vfs_error_reply(&err))
            }
        }
    }
}
