//! Consul KV over HTTP.
//!
//! Listing is `GET /v1/kv/<prefix>?recurse=true`, turned into a blocking query
//! with `index=<n>&wait=<w>`. The change index comes back in the
//! `X-Consul-Index` header and values are base64 in the JSON body.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use fsconsul_core::StoreConnection;

use crate::error::StoreError;
use crate::{KvEntry, KvListing, KvStore};

/// Server-side wait for a blocking query.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(300);

/// Added on top of the wait for the client-side request timeout. Consul adds
/// up to wait/16 of jitter to blocking queries.
const WAIT_MARGIN: Duration = Duration::from_secs(30);

const INDEX_HEADER: &str = "X-Consul-Index";
const TOKEN_HEADER: &str = "X-Consul-Token";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConsulKvPair {
    key: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    flags: u64,
}

impl TryFrom<ConsulKvPair> for KvEntry {
    type Error = StoreError;

    fn try_from(pair: ConsulKvPair) -> Result<Self, Self::Error> {
        let value = match pair.value {
            Some(encoded) => base64::engine::general_purpose::STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| {
                    StoreError::Transient(format!("undecodable value for key '{}': {e}", pair.key))
                })?,
            None => Vec::new(),
        };
        Ok(KvEntry {
            key: pair.key,
            value,
            flags: pair.flags,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConsulStore {
    http: reqwest::Client,
    base_url: Url,
    connection: StoreConnection,
    wait: Duration,
}

impl ConsulStore {
    pub fn new(connection: StoreConnection) -> Result<Self, StoreError> {
        Self::with_wait(connection, DEFAULT_WAIT)
    }

    /// Build a client whose blocking queries wait at most `wait` server-side.
    pub fn with_wait(connection: StoreConnection, wait: Duration) -> Result<Self, StoreError> {
        let base_url = base_url(&connection.address)?;
        let http = reqwest::Client::builder()
            .timeout(wait + WAIT_MARGIN)
            .build()
            .map_err(|e| StoreError::Permanent(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            connection,
            wait,
        })
    }

    fn kv_url(&self, prefix: &str) -> Result<Url, StoreError> {
        let mut url = self
            .base_url
            .join(&format!("v1/kv/{prefix}"))
            .map_err(|e| StoreError::Permanent(format!("invalid key prefix '{prefix}': {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("recurse", "true");
            if !self.connection.datacenter.is_empty() {
                query.append_pair("dc", &self.connection.datacenter);
            }
        }
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.connection.auth_token.is_empty() {
            req
        } else {
            req.header(TOKEN_HEADER, &self.connection.auth_token)
        }
    }

    /// One listing request; blocking when `after_index > 0`.
    async fn fetch(&self, prefix: &str, after_index: u64) -> Result<KvListing, StoreError> {
        let mut url = self.kv_url(prefix)?;
        if after_index > 0 {
            url.query_pairs_mut()
                .append_pair("index", &after_index.to_string())
                .append_pair("wait", &format!("{}s", self.wait.as_secs().max(1)));
        }

        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let index = parse_index(response.headers())?;
        if status == StatusCode::NOT_FOUND {
            return Ok(KvListing {
                entries: Vec::new(),
                index,
            });
        }

        let pairs: Vec<ConsulKvPair> = response
            .json()
            .await
            .map_err(|e| StoreError::Transient(format!("failed to decode listing: {e}")))?;
        let entries = pairs
            .into_iter()
            .map(KvEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(KvListing { entries, index })
    }
}

#[async_trait]
impl KvStore for ConsulStore {
    async fn list_prefix(&self, prefix: &str, after_index: u64) -> Result<KvListing, StoreError> {
        loop {
            let listing = self.fetch(prefix, after_index).await?;
            if after_index == 0 || listing.index > after_index {
                return Ok(listing);
            }
            if listing.index < after_index {
                return Err(StoreError::StaleIndex {
                    requested: after_index,
                    current: listing.index,
                });
            }
            // Wait elapsed without a change; block again.
            tracing::debug!(prefix, index = after_index, "blocking query timed out, re-polling");
        }
    }

    async fn delete_tree(&self, prefix: &str) -> Result<(), StoreError> {
        let url = self.kv_url(prefix)?;
        let response = self
            .authorize(self.http.delete(url))
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        tracing::info!(prefix, "deleted key tree");
        Ok(())
    }

    fn connection(&self) -> &StoreConnection {
        &self.connection
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn base_url(address: &str) -> Result<Url, StoreError> {
    let mut base = if address.contains("://") {
        address.to_owned()
    } else {
        format!("http://{address}")
    };
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base)
        .map_err(|e| StoreError::Permanent(format!("invalid store address '{address}': {e}")))
}

/// Index 0 is clamped to 1: callers treat 0 as "no prior observation" and a
/// blocking query on it would return at once.
fn parse_index(headers: &HeaderMap) -> Result<u64, StoreError> {
    headers
        .get(INDEX_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|index| index.max(1))
        .ok_or_else(|| StoreError::Transient(format!("response missing a valid {INDEX_HEADER} header")))
}

pub(crate) fn classify_status(status: StatusCode, body: &str) -> StoreError {
    let message = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };
    match status {
        StatusCode::TOO_MANY_REQUESTS => StoreError::Transient(message),
        s if s.is_server_error() => StoreError::Transient(message),
        s if s.is_client_error() => StoreError::Permanent(message),
        _ => StoreError::Transient(message),
    }
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_builder() {
        StoreError::Permanent(format!("invalid request: {err}"))
    } else {
        StoreError::Transient(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
