//! The RFC 2428 Extended Passive (`EPSV`) command.

use super::Session;
use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::datachan::{DataTransfer, PassiveError, PassiveTransfer};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Epsv {
    param: Option<String>,
}

impl Epsv {
    pub fn new(param: Option<String>) -> Self {
        Epsv { param }
    }
}

#[async_trait]
impl CommandHandler for Epsv {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        match self.param.as_deref() {
            None | Some("1") | Some("2") => {}
            Some(param) if param.eq_ignore_ascii_case("all") => {
                // From now on only EPSV may set up data connections.
                session.epsv_all = true;
                return Ok(Reply::new(ReplyCode::CommandOkay, "EPSV ALL accepted"));
            }
            Some(_) => return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Unsupported EPSV argument")),
        }

        let transfer = PassiveTransfer::listen(
            &session.server.port_pool,
            session.peer_addr.ip(),
            session.server.enable_address_check,
            session.data_tls(),
            session.logger.clone(),
        )
        .await;
        let transfer = match transfer {
            Ok(transfer) => transfer,
            Err(PassiveError::Disabled) => {
                return Ok(Reply::new(ReplyCode::CommandNotImplemented, "Passive mode is disabled"));
            }
            Err(err) => {
                slog::warn!(session.logger, "could not set up passive transfer: {}", err);
                return Ok(Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection"));
            }
        };

        let port = transfer.port();
        session.set_data_transfer(DataTransfer::Passive(transfer));

        Ok(Reply::new_with_string(
            ReplyCode::EnteringExtendedPassiveMode,
            format!("Entering extended passive mode (|||{}|)", port),
        ))
    }
}
