//! The RFC 959 Help (`HELP`) command.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Help {
    topic: Option<String>,
}

impl Help {
    pub fn new(topic: Option<String>) -> Self {
        Help { topic }
    }
}

#[async_trait]
impl CommandHandler for Help {
    async fn handle(&self, _session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        match &self.topic {
            None => Ok(Reply::new(ReplyCode::HelpMessage, "Commands follow RFC 959 and friends; try FEAT")),
            Some(topic) => Ok(Reply::new_with_string(
                ReplyCode::HelpMessage,
                format!("{}: see RFC 959", topic.to_uppercase()),
            )),
        }
    }
}
