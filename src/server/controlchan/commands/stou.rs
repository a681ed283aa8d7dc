//! The RFC 959 Store Unique (`STOU`) command.

use super::{cant_open_data_connection, vfs_error_reply, Session};
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use crate::vfs::Vfs;

use async_trait::async_trait;
use futures_util::SinkExt;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt::Write as _;

#[derive(Debug)]
pub struct Stou;

// A fresh random name within the working directory; 128 bits of OS
// randomness make a collision vanishingly unlikely.
fn unique_name() -> String {
    let mut buf = [0u8; 16];
    OsRng.fill_bytes(&mut buf);
    let mut name = String::with_capacity(32);
    for b in &buf {
        let _ = write!(name, "{:02x}", b);
    }
    name
}

#[async_trait]
impl CommandHandler for Stou {
    async fn handle(&self, session: &mut Session, control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let fs = match session.fs() {
            Some(fs) => fs,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in")),
        };
        let name = unique_name();
        let path = session.resolve(&name);

        // The chosen name travels in the preliminary reply so the client
        // can retrieve the file later.
        control
            .send(Reply::new_with_string(ReplyCode::FileStatusOkay, format!("FILE: {}", name)))
            .await?;

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_names_are_32_hex_chars_and_distinct() {
        let a = unique_name();
        let b = unique_name();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
