//! In-process [`KvStore`] with Consul-like listing semantics.
//!
//! Every mutation bumps a single change index and wakes blocked listings.
//! Like Consul's, the index starts at 1 and never reports 0.
//! Failures can be queued with [`MemoryStore::fail_next`]; each queued error
//! is returned by exactly one subsequent `list_prefix` call.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use fsconsul_core::StoreConnection;

use crate::error::StoreError;
use crate::{KvEntry, KvListing, KvStore};

#[derive(Debug, Default)]
struct MemoryState {
    index: u64,
    entries: BTreeMap<String, (Vec<u8>, u64)>,
    failures: VecDeque<StoreError>,
    list_calls: usize,
}

#[derive(Debug)]
pub struct MemoryStore {
    connection: StoreConnection,
    state: Mutex<MemoryState>,
    changes: watch::Sender<u64>,
}

impl MemoryStore {
    pub fn new(connection: StoreConnection) -> Self {
        let (changes, _) = watch::channel(1);
        Self {
            connection,
            state: Mutex::new(MemoryState {
                index: 1,
                ..MemoryState::default()
            }),
            changes,
        }
    }

    /// Store with a placeholder local connection.
    pub fn local() -> Self {
        Self::new(StoreConnection {
            address: "memory".into(),
            datacenter: String::new(),
            auth_token: String::new(),
        })
    }

    /// Set `key` to `value`; returns the new change index.
    pub fn put(&self, key: &str, value: impl Into<Vec<u8>>) -> u64 {
        self.put_with_flags(key, value, 0)
    }

    pub fn put_with_flags(&self, key: &str, value: impl Into<Vec<u8>>, flags: u64) -> u64 {
        self.mutate(|state| {
            state.entries.insert(key.to_owned(), (value.into(), flags));
        })
    }

    /// Remove a single key; returns the new change index.
    pub fn delete(&self, key: &str) -> u64 {
        self.mutate(|state| {
            state.entries.remove(key);
        })
    }

    /// Pretend the store lost its history: the index drops to `index`.
    pub fn reset_index(&self, index: u64) {
        let index = index.max(1);
        let mut state = self.lock();
        state.index = index;
        self.changes.send_replace(index);
    }

    /// Queue an error for the next `list_prefix` call.
    pub fn fail_next(&self, err: StoreError) {
        self.lock().failures.push_back(err);
    }

    pub fn current_index(&self) -> u64 {
        self.lock().index
    }

    /// Number of `list_prefix` calls issued so far, failed ones included.
    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mutate(&self, f: impl FnOnce(&mut MemoryState)) -> u64 {
        let mut state = self.lock();
        f(&mut state);
        state.index += 1;
        let index = state.index;
        self.changes.send_replace(index);
        index
    }

    fn snapshot(state: &MemoryState, prefix: &str) -> KvListing {
        let entries = state
            .entries
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, (value, flags))| KvEntry {
                key: key.clone(),
                value: value.clone(),
                flags: *flags,
            })
            .collect();
        KvListing {
            entries,
            index: state.index,
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn list_prefix(&self, prefix: &str, after_index: u64) -> Result<KvListing, StoreError> {
        // Subscribe before inspecting state so no change slips between the
        // check and the wait.
        let mut changes = self.changes.subscribe();
        {
            let mut state = self.lock();
            state.list_calls += 1;
            if let Some(err) = state.failures.pop_front() {
                return Err(err);
            }
        }

        loop {
            {
                let state = self.lock();
                if state.index < after_index {
                    return Err(StoreError::StaleIndex {
                        requested: after_index,
                        current: state.index,
                    });
                }
                if after_index == 0 || state.index > after_index {
                    return Ok(Self::snapshot(&state, prefix));
                }
            }
            changes
                .changed()
                .await
                .map_err(|_| StoreError::Transient("memory store closed".into()))?;
        }
    }

    async fn delete_tree(&self, prefix: &str) -> Result<(), StoreError> {
        self.mutate(|state| state.entries.retain(|key, _| !key.starts_with(prefix)));
        Ok(())
    }

    fn connection(&self) -> &StoreConnection {
        &self.connection
    }
}
