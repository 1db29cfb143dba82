//! Domain types for the fsconsul configuration model.
//!
//! Raw payload structs (`*Config`, [`WatchConfigPayload`]) mirror the config
//! file and carry no invariants. [`WatchConfig::from_payload`] turns them into
//! the validated [`StoreConnection`] + [`Mapping`] values used by the engine.

use std::fmt;
use std::path::{is_separator, PathBuf, MAIN_SEPARATOR};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MappingError};

/// Consul agent address used when neither the config nor the environment
/// provides one.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8500";

/// Environment variable consulted for a missing store address.
pub const ENV_ADDRESS: &str = "CONSUL_HTTP_ADDR";

/// Environment variable consulted for a missing auth token.
pub const ENV_TOKEN: &str = "CONSUL_HTTP_TOKEN";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A normalized store key prefix: non-empty, no leading or trailing `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct KeyPrefix(String);

impl KeyPrefix {
    /// Trim surrounding `/` and reject the empty result.
    pub fn parse(raw: &str) -> Result<Self, MappingError> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(MappingError::EmptyPrefix);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for KeyPrefix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Raw payload
// ---------------------------------------------------------------------------

/// `consul` section of the config payload. Every field is optional; gaps are
/// filled from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default, alias = "address", skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    #[serde(default, alias = "datacenter", skip_serializing_if = "Option::is_none")]
    pub dc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// One `mappings[]` entry as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(alias = "source_prefix")]
    pub prefix: String,
    #[serde(default, alias = "target_directory")]
    pub path: String,
    #[serde(default, alias = "on_change_command", skip_serializing_if = "Option::is_none")]
    pub onchange: Option<String>,
}

/// Root of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WatchConfigPayload {
    #[serde(default, alias = "store")]
    pub consul: StoreConfig,
    #[serde(default)]
    pub mappings: Vec<MappingConfig>,
}

// ---------------------------------------------------------------------------
// Validated model
// ---------------------------------------------------------------------------

/// Address and credentials of the remote store. Shared read-only by every
/// watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreConnection {
    pub address: String,
    /// Empty means "the agent's own datacenter".
    pub datacenter: String,
    #[serde(skip_serializing)]
    pub auth_token: String,
}

impl StoreConnection {
    /// Build a connection from the payload, consulting `env` for anything the
    /// payload leaves unset.
    pub fn from_config(config: &StoreConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |v: &Option<String>| v.as_ref().filter(|s| !s.trim().is_empty()).cloned();

        let address = non_empty(&config.addr)
            .or_else(|| env(ENV_ADDRESS).filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_owned());
        let auth_token = non_empty(&config.token)
            .or_else(|| env(ENV_TOKEN))
            .unwrap_or_default();

        Self {
            address: address.trim().to_owned(),
            datacenter: config.dc.clone().unwrap_or_default().trim().to_owned(),
            auth_token,
        }
    }
}

/// A prefix → directory pairing with an optional change hook.
///
/// Only constructible through [`Mapping::new`], which normalizes the target
/// directory exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    source_prefix: KeyPrefix,
    target_directory: PathBuf,
    on_change_command: Option<String>,
}

impl Mapping {
    pub fn new(
        source_prefix: &str,
        target_directory: &str,
        on_change_command: Option<String>,
    ) -> Result<Self, MappingError> {
        let source_prefix = KeyPrefix::parse(source_prefix)?;
        let target_directory = normalize_target_directory(target_directory)?;
        let on_change_command = on_change_command
            .map(|cmd| cmd.trim().to_owned())
            .filter(|cmd| !cmd.is_empty());

        Ok(Self {
            source_prefix,
            target_directory: PathBuf::from(target_directory),
            on_change_command,
        })
    }

    pub fn source_prefix(&self) -> &KeyPrefix {
        &self.source_prefix
    }

    /// Always ends in exactly one path separator.
    pub fn target_directory(&self) -> &PathBuf {
        &self.target_directory
    }

    pub fn on_change_command(&self) -> Option<&str> {
        self.on_change_command.as_deref()
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.source_prefix,
            self.target_directory.display()
        )
    }
}

/// Validated configuration handed to the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchConfig {
    pub connection: StoreConnection,
    pub mappings: Vec<Mapping>,
}

impl WatchConfig {
    /// Validate a payload, filling connection gaps from the process
    /// environment.
    pub fn from_payload(payload: WatchConfigPayload) -> Result<Self, ConfigError> {
        Self::from_payload_with_env(payload, |key| std::env::var(key).ok())
    }

    /// [`WatchConfig::from_payload`] with an explicit environment lookup.
    pub fn from_payload_with_env(
        payload: WatchConfigPayload,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if payload.mappings.is_empty() {
            return Err(ConfigError::NoMappings);
        }

        let mappings = payload
            .mappings
            .into_iter()
            .enumerate()
            .map(|(index, m)| {
                Mapping::new(&m.prefix, &m.path, m.onchange)
                    .map_err(|source| ConfigError::InvalidMapping { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            connection: StoreConnection::from_config(&payload.consul, env),
            mappings,
        })
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Strip one trailing stray quote left over from shell quoting, then make the
/// path end in exactly one separator.
fn normalize_target_directory(raw: &str) -> Result<String, MappingError> {
    let unquoted = raw
        .strip_suffix('"')
        .or_else(|| raw.strip_suffix('\''))
        .unwrap_or(raw);
    if unquoted.is_empty() {
        return Err(MappingError::EmptyTargetDirectory);
    }

    let base = unquoted.trim_end_matches(is_separator);
    let mut normalized = String::with_capacity(base.len() + 1);
    normalized.push_str(base);
    normalized.push(MAIN_SEPARATOR);
    Ok(normalized)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
