//! # fsconsul-store
//!
//! The narrow store interface the watch engine depends on, plus two
//! implementations: [`ConsulStore`] (HTTP long-poll against a Consul agent)
//! and [`MemoryStore`] (in-process, used by tests).
//!
//! Pending calls are cancelled by dropping the returned future.

pub mod consul;
pub mod error;
pub mod memory;

use async_trait::async_trait;

use fsconsul_core::StoreConnection;

pub use consul::ConsulStore;
pub use error::{StoreError, StoreErrorKind};
pub use memory::MemoryStore;

/// One key/value pair as returned by a listing. `value` holds raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub flags: u64,
}

/// Full set of entries under a prefix at a given change index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KvListing {
    pub entries: Vec<KvEntry>,
    pub index: u64,
}

#[async_trait]
pub trait KvStore: Send + Sync {
    /// List every entry under `prefix`.
    ///
    /// With `after_index == 0` this returns immediately. Otherwise it blocks
    /// (bounded by the implementation's wait time) until the store reports an
    /// index strictly greater than `after_index`.
    async fn list_prefix(&self, prefix: &str, after_index: u64) -> Result<KvListing, StoreError>;

    /// Remove every key under `prefix`. Administrative; not used by watchers.
    async fn delete_tree(&self, prefix: &str) -> Result<(), StoreError>;

    fn connection(&self) -> &StoreConnection;
}
