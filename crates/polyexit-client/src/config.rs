//! Client configuration, validated before any network access.

use std::fmt;
use std::time::Duration;

use alloy_primitives::Address;
use polyexit_proof::DEFAULT_RECEIPT_CONCURRENCY;
use reqwest::Url;
use thiserror::Error;

use crate::network_config::DEFAULT_NETWORK_CONFIG_URL;

/// Default timeout for JSON-RPC and HTTP requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors, reported by [`PosBridgeConfig::validate`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// URL that does not parse or is not http(s)
    #[error("Invalid {field} URL {url:?}: {reason}")]
    InvalidUrl {
        field: &'static str,
        url: String,
        reason: String,
    },
    #[error("Network version must not be empty")]
    EmptyVersion,
    /// Contract address override set to the zero address
    #[error("{field} address must not be zero")]
    ZeroAddress { field: &'static str },
    #[error("Request timeout must be positive")]
    ZeroTimeout,
    #[error("Receipt concurrency must be positive")]
    ZeroConcurrency,
}

/// Polygon PoS deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Network {
    /// Ethereum mainnet and Polygon PoS
    Mainnet,
    /// Goerli and Mumbai
    Testnet,
}

impl Network {
    /// Directory of the network in the address index
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }

    /// Network segment of proof API paths
    pub fn proof_api_network(&self) -> &'static str {
        match self {
            Network::Mainnet => "matic",
            Network::Testnet => "mumbai",
        }
    }

    /// Deployment version used when none is configured
    pub fn default_version(&self) -> &'static str {
        match self {
            Network::Mainnet => "v1",
            Network::Testnet => "mumbai",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON-RPC node of one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEndpoint {
    pub url: String,
    /// `user:password` for basic auth
    pub userpwd: Option<String>,
}

impl ChainEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            userpwd: None,
        }
    }
}

/// Everything needed to connect a [`crate::PosExitClient`]
#[derive(Debug, Clone)]
pub struct PosBridgeConfig {
    pub network: Network,
    pub version: String,
    /// Root chain (Ethereum) node
    pub parent: ChainEndpoint,
    /// Child chain (Bor) node
    pub child: ChainEndpoint,
    /// `RootChainProxy` override, looked up in the address index otherwise
    pub root_chain: Option<Address>,
    /// `RootChainManagerProxy` override, looked up in the address index otherwise
    pub root_chain_manager: Option<Address>,
    /// Proof API base URL; without it only local proof computation is available
    pub proof_api_url: Option<String>,
    /// Base URL of the network address index
    pub network_config_url: String,
    pub request_timeout: Duration,
    /// Receipts fetched in parallel when rebuilding a receipts trie
    pub receipt_concurrency: usize,
}

impl PosBridgeConfig {
    /// Configuration with default version, address index and transport settings
    pub fn new(network: Network, parent: ChainEndpoint, child: ChainEndpoint) -> Self {
        Self {
            network,
            version: network.default_version().to_string(),
            parent,
            child,
            root_chain: None,
            root_chain_manager: None,
            proof_api_url: None,
            network_config_url: DEFAULT_NETWORK_CONFIG_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            receipt_concurrency: DEFAULT_RECEIPT_CONCURRENCY,
        }
    }

    pub fn with_proof_api_url(mut self, proof_api_url: impl Into<String>) -> Self {
        self.proof_api_url = Some(proof_api_url.into());
        self
    }

    pub fn with_contracts(mut self, root_chain: Address, root_chain_manager: Address) -> Self {
        self.root_chain = Some(root_chain);
        self.root_chain_manager = Some(root_chain_manager);
        self
    }

    /// Check the configuration without touching the network
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("parent RPC", &self.parent.url)?;
        validate_url("child RPC", &self.child.url)?;
        validate_url("network config", &self.network_config_url)?;
        if let Some(proof_api_url) = &self.proof_api_url {
            validate_url("proof API", proof_api_url)?;
        }

        if self.version.trim().is_empty() {
            return Err(ConfigError::EmptyVersion);
        }
        if self.root_chain == Some(Address::ZERO) {
            return Err(ConfigError::ZeroAddress {
                field: "RootChainProxy",
            });
        }
        if self.root_chain_manager == Some(Address::ZERO) {
            return Err(ConfigError::ZeroAddress {
                field: "RootChainManagerProxy",
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.receipt_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

fn validate_url(field: &'static str, url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(format!("unsupported scheme {scheme}"))),
    }
}
