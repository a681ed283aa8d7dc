//! The RFC 959 Store (`STOR`) command.

use super::{cant_open_data_connection, vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use crate::vfs::Vfs;

use async_trait::async_trait;
use futures_util::SinkExt;

#[derive(Debug)]
pub struct Stor {
    path: String,
}

impl Stor {
    pub fn new(path: String) -> Self {
        Stor { path }
    }
}

#[async_trait]
impl CommandHandler for Stor {
    async fn handle(&self, session: &mut Session, control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let path = session.resolve(&self.path);

        control.send(Reply::new(ReplyCode::FileStatusOkay, "Data transfer starting")).await?;

        let mut conn = match session.dt.take_conn().await {
            Ok(conn) => conn,
            Err(err) => {
                slog::warn!(session.logger, "could not open data connection: {}", err);
                session.dt.close();
                return Ok(cant_open_data_connection());
            }
        };

        let stored = fs.create(&path, &mut conn).await;
        session.dt.close();

        match stored {
            Ok(n) => Ok(Reply::new_with_string(
                ReplyCode::ClosingDataConnection,
                format!("OK, received {} bytes.", n),
            )),
            Err(err) => {
                slog::warn!(session.logger, "store failed: {}", err; "path" => %path);
                Ok(vfs_error_reply(&err))
            }
        }
    }
}
