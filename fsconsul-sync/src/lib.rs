//! # fsconsul-sync
//!
//! Per-mapping watch loop: long-poll the store, mirror changed keys into the
//! target directory with hash-gated atomic writes, and fire the on-change
//! hook once per cycle that wrote something.
//!
//! [`MappingWatcher::run`] drives one mapping until shutdown or a permanent
//! store failure. [`apply_entries`] is the synchronous apply step on its own.

pub mod apply;
pub mod error;
pub mod hash_store;
pub mod hook;
pub mod paths;
pub mod watcher;
pub mod writer;

pub use apply::{apply_entries, ApplyReport};
pub use error::SyncError;
pub use hook::HookOutcome;
pub use watcher::{MappingWatcher, RetryPolicy, WatchState, WatcherExit, WatcherState};
pub use writer::WriteResult;
