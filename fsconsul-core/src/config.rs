//! Config file discovery and loading.
//!
//! # API pattern
//!
//! Functions come in two forms, mirroring each other:
//! - `fn_at(path: &Path, …)`: explicit location; used in tests with `TempDir`
//! - `fn(…)`: derives the location from `dirs::config_dir()`, delegates to `_at`
//!
//! Format is picked from the extension: `.yaml`/`.yml` is YAML, anything else
//! is JSON.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::{WatchConfig, WatchConfigPayload};

pub const CONFIG_DIR_NAME: &str = "fsconsul";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Serialization format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Yaml,
}

impl PayloadFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// `<config_dir>/fsconsul/config.json`: pure, no I/O.
pub fn default_config_path_at(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
}

/// `default_config_path_at` convenience wrapper.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(default_config_path_at(&dir))
}

/// Read and decode the payload at `path` without validating it.
pub fn read_payload_at(path: &Path) -> Result<WatchConfigPayload, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match PayloadFormat::from_path(path) {
        PayloadFormat::Json => {
            serde_json::from_str(&contents).map_err(|source| ConfigError::ParseJson {
                path: path.to_path_buf(),
                source,
            })
        }
        PayloadFormat::Yaml => {
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::ParseYaml {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Load and validate the config at `path`.
pub fn load_config_at(path: &Path) -> Result<WatchConfig, ConfigError> {
    WatchConfig::from_payload(read_payload_at(path)?)
}

/// `load_config_at` convenience wrapper using [`default_config_path`].
pub fn load_config() -> Result<WatchConfig, ConfigError> {
    load_config_at(&default_config_path()?)
}

/// Decode and validate an in-memory JSON payload.
pub fn parse_json(payload: &str) -> Result<WatchConfig, ConfigError> {
    WatchConfig::from_payload(serde_json::from_str(payload)?)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
