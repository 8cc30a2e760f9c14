//! Network address index, fetched once per network and version.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Network;

/// Public address index of the Polygon deployments
pub const DEFAULT_NETWORK_CONFIG_URL: &str = "https://static.matic.network/network";

/// Path of the checkpoint registry in the address index
pub const ROOT_CHAIN_PATH: &str = "Main.Contracts.RootChainProxy";
/// Path of the PoS bridge entry point in the address index
pub const ROOT_CHAIN_MANAGER_PATH: &str = "Main.POSContracts.RootChainManagerProxy";

/// Error types for address index lookups
#[derive(Error, Debug)]
pub enum NetworkConfigError {
    /// HTTP errors, including non-success status codes and malformed JSON
    #[error("Network config request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Dotted path absent from the index
    #[error("Network config has no {path} for {network}/{version}")]
    MissingKey {
        network: Network,
        version: String,
        path: String,
    },
    #[error("Network config value at {path} is not an address: {value}")]
    InvalidAddress { path: String, value: String },
}

/// Address index documents keyed by network and version.
///
/// Owned by whoever builds clients and shared through `Arc`. Concurrent misses on the
/// same key may both fetch; the first stored document wins.
#[derive(Debug)]
pub struct NetworkConfigCache {
    base_url: String,
    http: reqwest::Client,
    entries: RwLock<HashMap<(Network, String), Arc<Value>>>,
}

impl NetworkConfigCache {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, NetworkConfigError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            http,
            entries: RwLock::new(HashMap::new()),
        })
    }

    /// Index document of `network`/`version`, fetched on first use
    pub async fn get(
        &self,
        network: Network,
        version: &str,
    ) -> Result<Arc<Value>, NetworkConfigError> {
        let key = (network, version.to_string());
        if let Some(config) = self.entries.read().await.get(&key) {
            debug!("Network config {}/{} served from cache", network, version);
            return Ok(config.clone());
        }

        let fetched = Arc::new(self.fetch(network, version).await?);
        let mut entries = self.entries.write().await;
        Ok(entries.entry(key).or_insert(fetched).clone())
    }

    /// Value at a dotted `path` such as `Main.POSContracts.RootChainManagerProxy`
    pub async fn get_value(
        &self,
        network: Network,
        version: &str,
        path: &str,
    ) -> Result<Value, NetworkConfigError> {
        let config = self.get(network, version).await?;
        resolve_path(&config, path)
            .cloned()
            .ok_or_else(|| NetworkConfigError::MissingKey {
                network,
                version: version.to_string(),
                path: path.to_string(),
            })
    }

    /// Contract address at a dotted `path`
    pub async fn get_address(
        &self,
        network: Network,
        version: &str,
        path: &str,
    ) -> Result<Address, NetworkConfigError> {
        let value = self.get_value(network, version, path).await?;
        value
            .as_str()
            .and_then(|address| address.parse().ok())
            .ok_or_else(|| NetworkConfigError::InvalidAddress {
                path: path.to_string(),
                value: value.to_string(),
            })
    }

    async fn fetch(&self, network: Network, version: &str) -> Result<Value, NetworkConfigError> {
        let url = format!(
            "{}/{}/{}/index.json",
            self.base_url.trim_end_matches('/'),
            network,
            version
        );
        info!("Fetching network config from {} ...", url);
        let response = self.http.get(url).send().await?;
        match response.error_for_status() {
            Ok(res) => Ok(res.json().await?),
            Err(e) => Err(e.into()),
        }
    }
}

/// Walk a JSON document along a dotted path
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |value, key| value.get(key))
}
