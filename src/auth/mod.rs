//! Authorization of FTP users.
//!
//! An [`Authorizer`] checks a user name and password and, on success, hands
//! back an [`Authorization`] carrying the file system view the session is
//! allowed to use. Implementations are shared across all sessions and must
//! therefore be safe to call concurrently.

mod anonymous;
mod userlist;

pub use anonymous::Anonymous;
pub use userlist::UserList;

use crate::vfs::{ReadOnly, Vfs};

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// The error returned when authorization fails.
#[derive(Debug, Error)]
pub enum AuthorizeError {
    /// The user name or password is wrong.
    #[error("invalid user name or password")]
    InvalidCredentials,

    /// The authorizer itself failed, e.g. a malformed stored hash.
    #[error("authorizer failure: {0}")]
    Internal(String),
}

/// The result of a successful [`Authorizer::authorize`] call.
///
/// Immutable for the life of a session; a later `PASS` replaces it wholesale.
#[derive(Debug, Clone)]
pub struct Authorization {
    /// The user name that logged in.
    pub user: String,
    /// The file system view granted to this session.
    pub fs: Arc<dyn Vfs>,
}

/// Authorizes FTP users.
///
/// `fs` is the server's configured file system; implementations may return
/// it as-is, wrap it (e.g. read-only for guests) or substitute another one.
#[async_trait]
pub trait Authorizer: Send + Sync + Debug {
    /// Verifies `user`/`password` and returns the session's authorization.
    async fn authorize(&self, fs: &Arc<dyn Vfs>, user: &str, password: &str) -> Result<Authorization, AuthorizeError>;
}

/// An [`Authorizer`] that accepts no one. Useful for deployments that should
/// only come up once a real authorizer is configured.
#[derive(Debug, Default)]
pub struct Deny;

#[async_trait]
impl Authorizer for Deny {
    async fn authorize(&self, _fs: &Arc<dyn Vfs>, _user: &str, _password: &str) -> Result<Authorization, AuthorizeError> {
        Err(AuthorizeError::InvalidCredentials)
    }
}

pub(crate) fn read_only_view(fs: &Arc<dyn Vfs>) -> Arc<dyn Vfs> {
    Arc::new(ReadOnly::new(Arc::clone(fs)))
}
