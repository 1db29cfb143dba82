//! Store key → local path translation.
//!
//! A key `prefix/a/b/c` maps to `<target>/a/b/c`. Listings are string-prefix
//! matches, so `apple/x` comes back for prefix `app`; such keys are outside
//! the mapping and skipped.

use std::path::{Path, PathBuf};

use crate::error::SyncError;

/// Why a key produced nothing to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The key is the prefix node itself.
    PrefixNode,
    /// The key shares the prefix string but not the `prefix/` path segment.
    OutsidePrefix,
}

/// What a key means for the target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTarget<'a> {
    /// Write the entry's value to this relative path.
    File(&'a str),
    /// Folder marker (`prefix/dir/`): only create the directory.
    Directory(&'a str),
    Skip(SkipReason),
}

/// Strip `prefix` and exactly one `/` from `key`, keeping nested segments.
///
/// Returns [`SyncError::UnsafeKey`] when the remainder has empty, `.` or `..`
/// segments.
pub fn classify_key<'a>(prefix: &str, key: &'a str) -> Result<KeyTarget<'a>, SyncError> {
    let Some(rest) = key.strip_prefix(prefix) else {
        return Ok(KeyTarget::Skip(SkipReason::OutsidePrefix));
    };
    if rest.is_empty() {
        return Ok(KeyTarget::Skip(SkipReason::PrefixNode));
    }
    let Some(relative) = rest.strip_prefix('/') else {
        return Ok(KeyTarget::Skip(SkipReason::OutsidePrefix));
    };
    if relative.is_empty() {
        return Ok(KeyTarget::Skip(SkipReason::PrefixNode));
    }

    let (relative, is_dir) = match relative.strip_suffix('/') {
        Some(dir) => (dir, true),
        None => (relative, false),
    };
    if !is_safe_relative(relative) {
        return Err(SyncError::UnsafeKey {
            key: key.to_owned(),
        });
    }

    Ok(if is_dir {
        KeyTarget::Directory(relative)
    } else {
        KeyTarget::File(relative)
    })
}

/// `<target>/<seg>/<seg>/…` for a `/`-separated relative path.
pub fn target_path(target_directory: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .fold(target_directory.to_path_buf(), |path, segment| path.join(segment))
}

fn is_safe_relative(relative: &str) -> bool {
    relative
        .split('/')
        .all(|seg| !seg.is_empty() && seg != "." && seg != ".." && !seg.contains('\\'))
}
