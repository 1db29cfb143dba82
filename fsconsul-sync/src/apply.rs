//! Apply one listing to a mapping's target directory.

use fsconsul_core::Mapping;
use fsconsul_store::KvEntry;

use crate::hash_store::HashStore;
use crate::paths::{classify_key, target_path, KeyTarget};
use crate::writer::{self, WriteResult};

/// Per-cycle tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub written: usize,
    pub unchanged: usize,
    /// Prefix node, keys outside the mapping, folder markers, unsafe keys.
    pub skipped: usize,
    /// Filesystem errors; retried on a later cycle.
    pub failed: usize,
}

impl ApplyReport {
    pub fn changed(&self) -> bool {
        self.written > 0
    }
}

/// Mirror `entries` into the mapping's target directory.
///
/// Filesystem errors are logged and counted per entry; the remaining entries
/// are still applied. Keys no longer present in `entries` are left alone on
/// disk.
pub fn apply_entries(mapping: &Mapping, entries: &[KvEntry], known: &mut HashStore) -> ApplyReport {
    let prefix = mapping.source_prefix().as_str();
    let target = mapping.target_directory();
    let mut report = ApplyReport::default();

    for entry in entries {
        let relative = match classify_key(prefix, &entry.key) {
            Ok(KeyTarget::File(relative)) => relative,
            Ok(KeyTarget::Directory(relative)) => {
                let dir = target_path(target, relative);
                if let Err(err) = writer::ensure_dir(&dir) {
                    tracing::error!(key = %entry.key, error = %err, "failed to create directory");
                    report.failed += 1;
                } else {
                    report.skipped += 1;
                }
                continue;
            }
            Ok(KeyTarget::Skip(reason)) => {
                tracing::debug!(key = %entry.key, reason = ?reason, "skipping key");
                report.skipped += 1;
                continue;
            }
            Err(err) => {
                tracing::error!(key = %entry.key, error = %err, "skipping unsafe key");
                report.skipped += 1;
                continue;
            }
        };

        let path = target_path(target, relative);
        match writer::atomic_write(&path, relative, &entry.value, known) {
            Ok(WriteResult::Written { .. }) => report.written += 1,
            Ok(WriteResult::Unchanged { .. }) => report.unchanged += 1,
            Err(err) => {
                tracing::error!(key = %entry.key, error = %err, "failed to write entry");
                report.failed += 1;
            }
        }
    }

    report
}
