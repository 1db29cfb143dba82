//! fsconsul core library: configuration model, config loading, errors.
//!
//! Public API surface:
//! - [`types`]: store connection, mappings, and the raw config payload
//! - [`error`]: [`ConfigError`], [`MappingError`]
//! - [`config`]: locate, read, and validate config files

pub mod config;
pub mod error;
pub mod types;

pub use error::{ConfigError, MappingError};
pub use types::{
    KeyPrefix, Mapping, MappingConfig, StoreConfig, StoreConnection, WatchConfig,
    WatchConfigPayload,
};
