//! Error types for fsconsul-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while mirroring a single entry to disk.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key would resolve outside the target directory.
    #[error("key '{key}' does not map to a safe relative path")]
    UnsafeKey { key: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
