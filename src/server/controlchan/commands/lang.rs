//! The RFC 2640 Language (`LANG`) command. Only English is available.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Lang {
    lang: Option<String>,
}

impl Lang {
    pub fn new(lang: Option<String>) -> Self {
        Lang { lang }
    }
}

#[async_trait]
impl CommandHandler for Lang {
    async fn handle(&self, _session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        match &self.lang {
            None => Ok(Reply::new(ReplyCode::CommandOkay, "Language set to English")),
            Some(lang) if lang.to_ascii_lowercase().starts_with("en") => {
                Ok(Reply::new(ReplyCode::CommandOkay, "Language set to English"))
            }
            Some(_) => Ok(Reply::new(ReplyCode::CommandNotImplemented, "Language not available")),
        }
    }
}
