//! An authorizer backed by a static list of users with hashed passwords.

use super::{Authorization, AuthorizeError, Authorizer};
use crate::vfs::Vfs;

use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct User {
    name: String,
    // bcrypt hash of the password.
    password: String,
}

/// Verifies users against a configured list of `(name, bcrypt hash)` pairs
/// and grants full access to the server's file system.
#[derive(Debug)]
pub struct UserList {
    // Sorted by name so lookup is a binary search.
    users: Vec<User>,
}

impl UserList {
    /// Builds an authorizer from `(name, bcrypt hash)` pairs.
    pub fn new<I>(users: I) -> UserList
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut users: Vec<User> = users
            .into_iter()
            .map(|(name, password)| User { name, password })
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        UserList { users }
    }
}

#[async_trait]
impl Authorizer for UserList {
    async fn authorize(&self, fs: &Arc<dyn Vfs>, user: &str, password: &str) -> Result<Authorization, AuthorizeError> {
        let found = match self.users.binary_search_by(|u| u.name.as_str().cmp(user)) {
            Ok(idx) => &self.users[idx],
            Err(_) => return Err(AuthorizeError::InvalidCredentials),
        };
        match bcrypt::verify(password, &found.password) {
            Ok(true) => Ok(Authorization {
                user: user.to_string(),
                fs: Arc::clone(fs),
            }),
            Ok(false) => Err(AuthorizeError::InvalidCredentials),
            Err(err) => Err(AuthorizeError::Internal(err.to_string())),
        }
    }
}
