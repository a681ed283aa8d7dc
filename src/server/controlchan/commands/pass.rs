//! The RFC 959 Password (`PASS`) command.

use crate::server::controlchan::handler::CommandHandler;
use crate::server::controlchan::{ControlChanError, ControlStream, Reply, ReplyCode};
use crate::server::session::Session;
use crate::auth::Authorizer;

use async_trait::async_trait;
use std::time::Duration;

// Failed attempts beyond this end the session.
const MAX_FAILURES: u32 = 5;
// Brute-force deterrent before a failure reply.
const FAILURE_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct Pass {
    password: String,
}

impl Pass {
    pub fn new(password: String) -> Self {
        Pass { password }
    }
}

#[async_trait]
impl CommandHandler for Pass {
    async fn handle(&self, session: &mut Session, _control: &mut ControlStream) -> Result<Reply, ControlChanError> {
        let user = match session.username.clone() {
            Some(user) => user,
            None => return Ok(Reply::new(ReplyCode::BadCommandSequence, "Send USER first")),
        };

        let authorizer = session.server.authorizer.clone();
        match authorizer.authorize(&session.server.vfs, &user, &self.password).await {
            Ok(authorization) => {
                slog::info!(session.logger, "user logged in"; "user" => %user);
                session.auth = Some(authorization);
                session.cwd = "/".to_string();
                session.auth_failures = 0;
                Ok(Reply::new(ReplyCode::UserLoggedIn, "User logged in, proceed"))
            }
            Err(err) => {
                slog::info!(session.logger, "login failed: {}", err; "user" => %user);
                session.auth_failures += 1;
                let anonymous = user == "anonymous" || user == "ftp";
                if !anonymous || session.auth_failures > 1 {
                    tokio::time::sleep(FAILURE_DELAY).await;
                }
                if session.auth_failures > MAX_FAILURES {
                    session.closing = true;
                }
                Ok(Reply::new(ReplyCode::NotLoggedIn, "Invalid user name or password"))
            }
        }
    }
}
