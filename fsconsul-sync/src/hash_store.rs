//! Hash store: SHA-256 fingerprints of the last bytes written per entry.
//!
//! Lives only as long as its watcher. It is an optimization: losing it means
//! the next cycle rewrites identical bytes, nothing worse.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

/// Maps relative file paths (as derived from store keys) to the SHA-256 hex
/// digest of their last written content.
pub type HashStore = HashMap<String, String>;

/// SHA-256 hex digest of `content`.
pub fn fingerprint(content: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(content);
    hex::encode(h.finalize())
}
