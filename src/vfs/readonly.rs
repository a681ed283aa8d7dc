//! A decorator that makes any file system read only.

use super::{FileInfo, FileReader, Result, Vfs, VfsError};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::AsyncRead;

const WRITE_BITS: u32 = 0o222;

/// Wraps another [`Vfs`] and turns every write operation into
/// [`VfsError::PermissionDenied`]. Write permission bits are masked from the
/// modes of returned entries so listings reflect the restriction.
#[derive(Debug)]
pub struct ReadOnly {
    inner: Arc<dyn Vfs>,
}

impl ReadOnly {
    /// Wraps `inner` in a read-only view.
    pub fn new(inner: Arc<dyn Vfs>) -> ReadOnly {
        ReadOnly { inner }
    }

    fn mask(mut fi: FileInfo) -> FileInfo {
        fi.mode &= !WRITE_BITS;
        fi
    }
}

#[async_trait]
impl Vfs for ReadOnly {
    async fn open(&self, path: &str) -> Result<FileReader> {
        self.inner.open(path).await
    }

    async fn stat(&self, path: &str) -> Result<FileInfo> {
        self.inner.stat(path).await.map(ReadOnly::mask)
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<FileInfo>> {
        let entries = self.inner.read_dir(path).await?;
        Ok(entries.into_iter().map(ReadOnly::mask).collect())
    }

    async fn create(&self, _path: &str, _reader: &mut (dyn AsyncRead + Send + Unpin)) -> Result<u64> {
        Err(VfsError::PermissionDenied)
    }

    async fn mkdir(&self, _path: &str) -> Result<()> {
        Err(VfsError::PermissionDenied)
    }

    async fn remove(&self, _path: &str) -> Result<()> {
        Err(VfsError::PermissionDenied)
    }

    fn name(&self) -> &'static str {
        "readonly"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::Memory;
    use std::io::Cursor;

    fn fixture() -> ReadOnly {
        ReadOnly::new(Arc::new(Memory::with_files(vec![("file.txt", "content")])))
    }

    #[tokio::test]
    async fn reads_pass_through() {
        let fs = fixture();
        assert!(fs.open("/file.txt").await.is_ok());
        let fi = fs.stat("/file.txt").await.unwrap();
        assert_eq!(fi.mode & 0o222, 0);
        let entries = fs.read_dir("/").await.unwrap();
        assert!(entries.iter().all(|fi| fi.mode & 0o222 == 0));
    }

    #[tokio::test]
    async fn writes_are_denied() {
        let fs = fixture();
        let mut src = Cursor::new(b"x".to_vec());
        assert!(matches!(fs.create("/new", &mut src).await, Err(VfsError::PermissionDenied)));
        assert!(matches!(fs.mkdir("/dir").await, Err(VfsError::PermissionDenied)));
        assert!(matches!(fs.remove("/file.txt").await, Err(VfsError::PermissionDenied)));
    }
}
