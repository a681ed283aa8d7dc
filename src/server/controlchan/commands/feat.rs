//! The RFC 2389 Feature (`FEAT`) command.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Feat;

#[async_trait]
impl CommandHandler for Feat {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let mut features = vec![
            " EPRT",
            " EPSV",
            " LANG en",
            " MDTM",
            " MLSD",
            " MLST Type*;Modify*;Size*;Perm*;",
            " SIZE",
            " STOU",
            " UTF8",
        ];
        if session.server.tls_config.is_some() {
            features.push(" AUTH TLS");
            features.push(" PBSZ");
            features.push(" PROT");
        }
        // Each feature line is indented by one space, alphabetically.
        features.sort_unstable();
        features.insert(0, "Extensions supported:");
        features.push("END");

        Ok(Reply::new_multiline(ReplyCode::SystemStatus, features))
    }
}
