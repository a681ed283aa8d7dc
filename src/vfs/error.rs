//! Defines the error type returned by virtual file system operations.

use thiserror::Error;

/// The error type returned by [`Vfs`](crate::vfs::Vfs) implementations.
#[derive(Debug, Error)]
pub enum VfsError {
    /// The file or directory does not exist.
    #[error("no such file or directory")]
    NotFound,

    /// The operation is not permitted on this file system.
    #[error("permission denied")]
    PermissionDenied,

    /// Something already exists at the target path.
    #[error("file exists")]
    AlreadyExists,

    /// The directory cannot be removed because it still has entries.
    #[error("directory not empty")]
    NotEmpty,

    /// An underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl VfsError {
    /// Tells whether this error means the path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound)
    }
}
