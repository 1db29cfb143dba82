//! Hash-gated atomic writer.
//!
//! ## `atomic_write`: 5-step protocol
//!
//! 1. SHA-256 hash the entry's raw bytes.
//! 2. Compare with the stored hash → skip if identical.
//! 3. Create missing parent directories.
//! 4. Write to `<path>.fsconsul.tmp` through a scoped file handle.
//! 5. Rename to the final path (atomic on POSIX), then record the hash.
//!
//! Bytes are written verbatim; no line-ending or encoding changes.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};
use crate::hash_store::{self, HashStore};

/// Suffix of the temporary sibling used during a write.
pub const TMP_SUFFIX: &str = ".fsconsul.tmp";

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or not previously seen).
    Written { path: PathBuf },
    /// File was skipped: content matches the stored hash.
    Unchanged { path: PathBuf },
}

/// Atomically write `content` to `path` unless `hash_store[key]` already
/// holds its fingerprint.
///
/// The hash entry is only updated after a successful rename, so a failed
/// write is retried on the next cycle.
pub fn atomic_write(
    path: &Path,
    key: &str,
    content: &[u8],
    hash_store: &mut HashStore,
) -> Result<WriteResult, SyncError> {
    atomic_write_with_tmp(path, key, content, hash_store, &tmp_path_for(path))
}

fn atomic_write_with_tmp(
    path: &Path,
    key: &str,
    content: &[u8],
    hash_store: &mut HashStore,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    let digest = hash_store::fingerprint(content);

    if hash_store.get(key) == Some(&digest) {
        tracing::debug!(path = %path.display(), "unchanged");
        return Ok(WriteResult::Unchanged {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        ensure_dir(tmp_parent)?;
    }

    if let Err(e) = write_file(tmp, content) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(tmp, e));
    }

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    hash_store.insert(key.to_owned(), digest);

    tracing::info!(path = %path.display(), bytes = content.len(), "wrote");
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

/// Create `dir` and all of its missing parents.
pub fn ensure_dir(dir: &Path) -> Result<(), SyncError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))
}

/// The handle is dropped, and so closed, on every return path.
fn write_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
