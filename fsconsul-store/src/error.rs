//! Error types for fsconsul-store.

use thiserror::Error;

/// Recovery class of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Transient,
    StaleIndex,
    Permanent,
}

/// All errors a [`crate::KvStore`] call can surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Network timeout, connection reset, overloaded or failing server.
    #[error("transient store error: {0}")]
    Transient(String),

    /// The requested change index is no longer available.
    #[error("change index {requested} is no longer available (store is at {current})")]
    StaleIndex { requested: u64, current: u64 },

    /// Authentication rejected, malformed request, or unusable address.
    #[error("store rejected request: {0}")]
    Permanent(String),
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Transient(_) => StoreErrorKind::Transient,
            StoreError::StaleIndex { .. } => StoreErrorKind::StaleIndex,
            StoreError::Permanent(_) => StoreErrorKind::Permanent,
        }
    }

    /// `true` for every kind a watcher recovers from on its own.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind(), StoreErrorKind::Permanent)
    }
}
