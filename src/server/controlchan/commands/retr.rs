//! The RFC 959 Retrieve (`RETR`) command.

use super::{cant_open_data_connection, vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use crate::vfs::Vfs;

use async_trait::async_trait;
use futures_util::SinkExt;
use tokio::io::AsyncWriteExt;

#[derive(Debug)]
pub struct Retr {
    path: String,
}

impl Retr {
    pub fn new(path: String) -> Self {
        Retr { path }
    }
}

#[async_trait]
impl CommandHandler for Retr {
    async fn handle(&self, session: &mut Session, control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let path = session.resolve(&self.path);

        // Open before announcing the transfer, so a missing file fails with
        // a clean 550 and no data connection.
        let mut reader = match fs.open(&path).await {
            Ok(reader) => reader,
            Err(err) => return Ok(vfs_error_reply(&err)),
        };

        control.send(Reply::new(ReplyCode::FileStatusOkay, "Data transfer starting")).await?;

        let mut conn = match session.dt.take_conn().await {
            Ok(conn) => conn,
            Err(err) => {
                slog::warn!(session.logger, "could not open data connection: {}", err);
                session.dt.close();
                return Ok(cant_open_data_connection());
            }
        };

        let sent = async {
            let n = tokio::io::copy(&mut reader, &mut conn).await?;
            conn.shutdown().await?;
            Ok::<u64, std::io::Error>(n)
        }
        .await;
        session.dt.close();

        match sent {
            Ok(n) => Ok(Reply::new_with_string(
                ReplyCode::ClosingDataConnection,
                format!("Data transfer starting {} bytes", n),
            )),
            Err(err) => {
                slog::warn!(session.logger, "data transfer failed: {}", err; "path" => %path);
                Ok(Reply::new(ReplyCode::ConnectionClosed, "Data transfer aborted"))
            }
        }
    }
}
