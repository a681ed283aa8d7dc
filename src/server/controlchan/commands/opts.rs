//! The RFC 2389 Options (`OPTS`) command. Only `UTF8 ON` is recognized.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Opts {
    option: String,
}

impl Opts {
    pub fn new(option: String) -> Self {
        Opts { option }
    }
}

#[async_trait]
impl CommandHandler for Opts {
    async fn handle(&self, _session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        if self.option.eq_ignore_ascii_case("utf8 on") {
            return Ok(Reply::new(ReplyCode::CommandOkay, "Always in UTF-8 mode."));
        }
        Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Unknown option"))
    }
}
