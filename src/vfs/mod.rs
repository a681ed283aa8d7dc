//! The virtual file system consumed by the FTP protocol engine.
//!
//! A [`Vfs`] maps slash-separated paths to objects in some backing store.
//! The protocol engine only ever talks to this trait, so a backend for any
//! object store can be plugged in without touching the server itself. The
//! crate ships three implementations: [`Memory`] (a map-backed file system
//! used as the reference implementation and in tests), [`ReadOnly`] (a
//! decorator that rejects every write) and [`Null`] (the default when no
//! file system is configured).

mod error;
mod mapfs;
mod null;
mod readonly;

pub use error::VfsError;
pub use mapfs::Memory;
pub use null::Null;
pub use readonly::ReadOnly;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::{self, Debug, Write as _};
use tokio::io::AsyncRead;

/// Result type used by the [`Vfs`] trait.
pub type Result<T> = std::result::Result<T, VfsError>;

/// A readable handle on a file's content.
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

/// Describes one entry of the virtual file system.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    /// Base name of the entry, without any directory components.
    pub name: String,
    /// Size in bytes. Zero for directories.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// Tells whether the entry is a directory.
    pub is_dir: bool,
    /// Unix permission bits (e.g. `0o644`).
    pub mode: u32,
}

impl FileInfo {
    /// Renders the mode as the familiar `ls -l` string, e.g. `-rw-r--r--`.
    pub fn mode_string(&self) -> String {
        let mut s = String::with_capacity(10);
        s.push(if self.is_dir { 'd' } else { '-' });
        for shift in [6u32, 3, 0] {
            let bits = (self.mode >> shift) & 0o7;
            s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        s
    }
}

impl fmt::Display for FileInfo {
    /// Formats the entry as one line of a Unix-style directory listing.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut line = String::new();
        // Errors from write! into a String cannot happen.
        let _ = write!(
            line,
            "{} 1 user user {:>12} {} {}",
            self.mode_string(),
            self.size,
            self.modified.format("%b %e %H:%M"),
            self.name
        );
        f.write_str(&line)
    }
}

/// The epoch, used as the modification time of entries that do not carry one.
pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.timestamp(0, 0)
}

/// A context-aware virtual file system.
///
/// All paths are forward-slash separated. Implementations must accept both
/// rooted (`/foo/bar`) and unrooted (`foo/bar`) spellings; `""` and `"/"`
/// denote the root directory, which always exists. Cancellation is expressed
/// through future cancellation: dropping the returned future abandons the
/// operation.
#[async_trait]
pub trait Vfs: Send + Sync + Debug {
    /// Opens the named file for reading.
    async fn open(&self, path: &str) -> Result<FileReader>;

    /// Returns a [`FileInfo`] describing the named file or directory.
    async fn stat(&self, path: &str) -> Result<FileInfo>;

    /// Reads the contents of the directory, sorted by name.
    async fn read_dir(&self, path: &str) -> Result<Vec<FileInfo>>;

    /// Streams `reader` into a new object at `path`, truncating anything
    /// already there. Returns the number of bytes written. Fails with
    /// [`VfsError::AlreadyExists`] when `path` is a directory.
    async fn create(&self, path: &str, reader: &mut (dyn AsyncRead + Send + Unpin)) -> Result<u64>;

    /// Creates a new directory. Fails with [`VfsError::AlreadyExists`] when
    /// anything already exists at `path`.
    async fn mkdir(&self, path: &str) -> Result<()>;

    /// Removes a file, or a directory if it is empty.
    async fn remove(&self, path: &str) -> Result<()>;

    /// A short name identifying the implementation, for logs.
    fn name(&self) -> &'static str;
}

/// Lexically cleans `path` into an absolute, slash-separated form.
///
/// `.` components are dropped, `..` pops the previous component and is
/// clamped at the root, and repeated slashes collapse. The result always
/// starts with `/` and never ends with one (except for the root itself).
pub fn clean(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for comp in path.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    out.push_str(&parts.join("/"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_paths() {
        assert_eq!(clean(""), "/");
        assert_eq!(clean("/"), "/");
        assert_eq!(clean("foo"), "/foo");
        assert_eq!(clean("/foo/bar/"), "/foo/bar");
        assert_eq!(clean("foo//bar"), "/foo/bar");
        assert_eq!(clean("foo/./bar"), "/foo/bar");
        assert_eq!(clean("foo/../bar"), "/bar");
        assert_eq!(clean("../.."), "/");
        assert_eq!(clean("/a/b/../../../c"), "/c");
    }

    #[test]
    fn mode_strings() {
        let fi = FileInfo {
            name: "f".to_string(),
            size: 0,
            modified: epoch(),
            is_dir: false,
            mode: 0o644,
        };
        assert_eq!(fi.mode_string(), "-rw-r--r--");

        let dir = FileInfo { is_dir: true, mode: 0o755, ..fi };
        assert_eq!(dir.mode_string(), "drwxr-xr-x");
    }
}
