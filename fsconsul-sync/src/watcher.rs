//! Mapping watcher: the per-mapping long-poll loop.
//!
//! ```text
//! Idle ─▶ Polling ─▶ Applying ─▶ Idle
//!            │ transient: back off, retry with the same index
//!            │ stale index: reset to 0, retry at once
//!            └ permanent: Failed
//! any state ─ shutdown ─▶ Stopped
//! ```
//!
//! A watcher owns its [`WatchState`] exclusively and never talks to other
//! watchers. Polls are strictly sequential: the next listing is only requested
//! once the previous one is fully applied and its hook has returned. A stop
//! request during the hook kills the hook process.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use fsconsul_core::Mapping;
use fsconsul_store::{KvListing, KvStore, StoreError, StoreErrorKind};

use crate::apply::{apply_entries, ApplyReport};
use crate::hash_store::HashStore;
use crate::hook;

/// Bounded exponential backoff for transient store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay to use after `current`, doubling up to `max`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Polling,
    Applying,
    Stopped,
    Failed,
}

/// Per-mapping progress. `last_index == 0` means "nothing observed yet".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchState {
    pub last_index: u64,
    pub known_entries: HashStore,
}

/// How [`MappingWatcher::run`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherExit {
    Stopped,
    Failed(StoreError),
}

pub struct MappingWatcher {
    mapping: Mapping,
    store: Arc<dyn KvStore>,
    retry: RetryPolicy,
    watch_state: WatchState,
    state: WatcherState,
}

impl MappingWatcher {
    pub fn new(mapping: Mapping, store: Arc<dyn KvStore>) -> Self {
        Self {
            mapping,
            store,
            retry: RetryPolicy::default(),
            watch_state: WatchState::default(),
            state: WatcherState::Idle,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn watch_state(&self) -> &WatchState {
        &self.watch_state
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Watch until `shutdown` fires (or its sender is dropped) or the store
    /// reports a permanent failure.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> WatcherExit {
        let mut delay = self.retry.initial;
        tracing::info!(mapping = %self.mapping, "watcher started");

        loop {
            self.transition(WatcherState::Polling);
            let polled = tokio::select! {
                biased;
                _ = shutdown.recv() => return self.stopped(),
                polled = self.poll() => polled,
            };

            let err = match polled {
                Ok(listing) => {
                    delay = self.retry.initial;
                    let report = self.apply_listing(listing);
                    if let Some(command) = self.hook_for(&report) {
                        tokio::select! {
                            biased;
                            _ = shutdown.recv() => return self.stopped(),
                            _ = hook::run_on_change(&command) => {}
                        }
                    }
                    self.transition(WatcherState::Idle);
                    continue;
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                self.transition(WatcherState::Failed);
                tracing::error!(mapping = %self.mapping, error = %err, "watcher failed");
                return WatcherExit::Failed(err);
            }

            if err.kind() == StoreErrorKind::StaleIndex {
                tracing::warn!(
                    mapping = %self.mapping,
                    error = %err,
                    "change index expired, resyncing from scratch",
                );
                self.watch_state.last_index = 0;
                continue;
            }

            tracing::warn!(
                mapping = %self.mapping,
                index = self.watch_state.last_index,
                retry_in_ms = delay.as_millis() as u64,
                error = %err,
                "store poll failed, backing off",
            );
            tokio::select! {
                biased;
                _ = shutdown.recv() => return self.stopped(),
                _ = tokio::time::sleep(delay) => {}
            }
            delay = self.retry.next_delay(delay);
        }
    }

    /// One Polling → Applying → Idle pass with no retry handling.
    pub async fn cycle(&mut self) -> Result<ApplyReport, StoreError> {
        self.transition(WatcherState::Polling);
        let listing = self.poll().await?;
        let report = self.apply_listing(listing);
        if let Some(command) = self.hook_for(&report) {
            hook::run_on_change(&command).await;
        }
        self.transition(WatcherState::Idle);
        Ok(report)
    }

    fn poll(&self) -> impl std::future::Future<Output = Result<KvListing, StoreError>> + '_ {
        self.store
            .list_prefix(self.mapping.source_prefix().as_str(), self.watch_state.last_index)
    }

    /// Write the listing and advance `last_index`. The hook is left to the
    /// caller so `run` can race it against shutdown.
    fn apply_listing(&mut self, listing: KvListing) -> ApplyReport {
        self.transition(WatcherState::Applying);
        let report = apply_entries(
            &self.mapping,
            &listing.entries,
            &mut self.watch_state.known_entries,
        );
        tracing::debug!(
            mapping = %self.mapping,
            index = listing.index,
            written = report.written,
            unchanged = report.unchanged,
            skipped = report.skipped,
            failed = report.failed,
            "applied listing",
        );
        self.watch_state.last_index = listing.index;
        report
    }

    fn hook_for(&self, report: &ApplyReport) -> Option<String> {
        if !report.changed() {
            return None;
        }
        self.mapping.on_change_command().map(str::to_owned)
    }

    fn stopped(&mut self) -> WatcherExit {
        self.transition(WatcherState::Stopped);
        tracing::info!(mapping = %self.mapping, "watcher stopped");
        WatcherExit::Stopped
    }

    fn transition(&mut self, next: WatcherState) {
        tracing::trace!(mapping = %self.mapping, from = ?self.state, to = ?next, "watcher state");
        self.state = next;
    }
}
