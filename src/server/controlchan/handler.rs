//! The interface every command handler implements.

use super::{ControlChanError, ControlStream, Reply};
use crate::server::session::Session;

use async_trait::async_trait;

// One FTP verb. Handlers mutate the session and usually return the final
// reply; handlers that run a data transfer additionally write the
// preliminary `150` themselves so the whole exchange stays on the session
// task and appears in order on the control channel.
#[async_trait]
pub(crate) trait CommandHandler: Send + Sync + std::fmt::Debug {
    async fn handle(&self, session: &mut Session, control: &mut ControlStream) -> Result<Reply, ControlChanError>;
}
