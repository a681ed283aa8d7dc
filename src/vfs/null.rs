//! The null file system, used when nothing else is configured.

use super::{FileInfo, FileReader, Result, Vfs, VfsError};

use async_trait::async_trait;
use tokio::io::AsyncRead;

/// A file system with nothing in it.
///
/// Reads fail with [`VfsError::NotFound`] (listing the root yields an empty
/// directory); writes succeed but their content is discarded.
#[derive(Debug, Default)]
pub struct Null;

#[async_trait]
impl Vfs for Null {
    async fn open(&self, _path: &str) -> Result<FileReader> {
        Err(VfsError::NotFound)
    }

    async fn stat(&self, path: &str) -> Result<FileInfo> {
        if path.is_empty() || path == "/" {
            return Ok(FileInfo {
                name: "/".to_string(),
                size: 0,
                modified: super::epoch(),
                is_dir: true,
                mode: 0o755,
            });
        }
        Err(VfsError::NotFound)
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<FileInfo>> {
        if path.is_empty() || path == "/" {
            return Ok(Vec::new());
        }
        Err(VfsError::NotFound)
    }

    async fn create(&self, _path: &str, reader: &mut (dyn AsyncRead + Send + Unpin)) -> Result<u64> {
        let mut sink = tokio::io::sink();
        let n = tokio::io::copy(reader, &mut sink).await?;
        Ok(n)
    }

    async fn mkdir(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_fail_writes_discard() {
        let fs = Null;
        assert!(matches!(fs.open("/x").await, Err(VfsError::NotFound)));
        assert!(fs.stat("/").await.unwrap().is_dir);
        assert_eq!(fs.read_dir("/").await.unwrap().len(), 0);
        assert!(matches!(fs.read_dir("/x").await, Err(VfsError::NotFound)));

        let mut src = std::io::Cursor::new(b"discarded".to_vec());
        assert_eq!(fs.create("/x", &mut src).await.unwrap(), 9);
        assert!(fs.mkdir("/d").await.is_ok());
        assert!(fs.remove("/d").await.is_ok());
    }
}
