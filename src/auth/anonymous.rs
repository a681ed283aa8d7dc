//! The anonymous authorizer.

use super::{read_only_view, Authorization, AuthorizeError, Authorizer};
use crate::vfs::Vfs;

use async_trait::async_trait;
use std::sync::Arc;

/// Accepts the conventional guest users `anonymous` and `ftp` with any
/// password and grants them a read-only view of the server's file system.
#[derive(Debug, Default)]
pub struct Anonymous;

#[async_trait]
impl Authorizer for Anonymous {
    async fn authorize(&self, fs: &Arc<dyn Vfs>, user: &str, _password: &str) -> Result<Authorization, AuthorizeError> {
        if user != "anonymous" && user != "ftp" {
            return Err(AuthorizeError::InvalidCredentials);
        }
        Ok(Authorization {
            user: user.to_string(),
            fs: read_only_view(fs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::{Memory, VfsError};

    #[tokio::test]
    async fn guests_get_read_only_access() {
        let fs: Arc<dyn Vfs> = Arc::new(Memory::new());
        let auth = Anonymous.authorize(&fs, "anonymous", "whatever").await.unwrap();
        assert_eq!(auth.user, "anonymous");
        assert!(matches!(auth.fs.mkdir("/dir").await, Err(VfsError::PermissionDenied)));

        assert!(Anonymous.authorize(&fs, "ftp", "").await.is_ok());
        assert!(Anonymous.authorize(&fs, "root", "hunter2").await.is_err());
    }
}
