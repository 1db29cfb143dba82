//! Error types for fsconsul-core.

use std::path::PathBuf;

use thiserror::Error;

/// A single mapping entry failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The prefix was empty once surrounding `/` were removed.
    #[error("source prefix is empty")]
    EmptyPrefix,

    /// The target directory was empty (after stray-quote stripping).
    #[error("target directory is empty")]
    EmptyTargetDirectory,
}

/// All errors that can arise while building a [`crate::WatchConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse error on load: includes the file path.
    #[error("failed to parse JSON config at {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parse error on load: includes the file path.
    #[error("failed to parse YAML config at {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON payload supplied in memory was structurally invalid.
    #[error("invalid config payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The mapping list was empty.
    #[error("config contains no mappings")]
    NoMappings,

    /// A mapping at `index` failed validation.
    #[error("mapping #{index} is invalid: {source}")]
    InvalidMapping {
        index: usize,
        #[source]
        source: MappingError,
    },

    /// `dirs::config_dir()` returned `None`.
    #[error("cannot determine config directory; pass --config explicitly")]
    ConfigDirNotFound,
}
