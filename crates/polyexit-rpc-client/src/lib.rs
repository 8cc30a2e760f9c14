//! Ethereum JSON-RPC client for the PoS bridge root and child chains, with retry logic.

use alloy_primitives::{Address, Bytes};
use base64::{engine::general_purpose, Engine as _};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::http_client::{HeaderMap, HeaderValue, HttpClient};
use jsonrpsee::rpc_params;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

mod child_chain;
pub mod contracts;
mod root_chain;
pub mod wire;

pub use child_chain::ChildChainClient;
pub use root_chain::RootChainClient;

/// Error types for Ethereum RPC client operations
#[derive(Error, Debug)]
pub enum RpcClientError {
    /// RPC client errors
    #[error("RPC client error: {0}")]
    RpcClient(#[from] jsonrpsee::core::client::Error),
    /// Invalid HTTP header value
    #[error("Invalid HTTP header value")]
    InvalidHeader,
    /// Failed to decode hex response
    #[error("Failed to decode hex response: {0}")]
    HexDecode(#[from] hex::FromHexError),
    /// Failed to decode contract return data
    #[error("Failed to decode contract return data: {0}")]
    AbiDecode(#[from] alloy_sol_types::Error),
    /// The node returned `null` for the requested object
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    /// Response is well-formed JSON but not a valid value
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Default HTTP request timeout
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Ethereum JSON-RPC client
#[derive(Debug)]
pub struct EthRpcClient {
    client: HttpClient,
    backoff: backoff::ExponentialBackoff,
}

impl EthRpcClient {
    /// Create a new RPC client with default retry settings (exponential backoff)
    pub fn new(url: String, userpwd: Option<String>) -> Result<Self, RpcClientError> {
        Self::with_timeout(url, userpwd, HTTP_REQUEST_TIMEOUT)
    }

    /// Create a new RPC client with a custom request timeout
    pub fn with_timeout(
        url: String,
        userpwd: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RpcClientError> {
        let mut headers = HeaderMap::new();
        if let Some(userpwd) = userpwd {
            let creds = general_purpose::STANDARD.encode(userpwd);
            headers.insert(
                "Authorization",
                HeaderValue::from_str(&format!("Basic {creds}"))
                    .map_err(|_| RpcClientError::InvalidHeader)?,
            );
        };

        let client = HttpClient::builder()
            .set_headers(headers)
            .request_timeout(timeout)
            .build(url)?;

        Ok(Self {
            client,
            backoff: backoff::ExponentialBackoff::default(),
        })
    }

    /// Replace the retry policy
    pub fn with_backoff(mut self, backoff: backoff::ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: ArrayParams,
    ) -> Result<T, RpcClientError> {
        request_with_retry(self.backoff.clone(), || async {
            self.client
                .request(method, params.clone())
                .await
                .map_err(Into::into)
        })
        .await
    }

    /// Request an object the node may answer with `null`
    pub async fn request_object<T: DeserializeOwned>(
        &self,
        method: &str,
        params: ArrayParams,
        kind: &'static str,
        id: impl ToString,
    ) -> Result<T, RpcClientError> {
        self.request::<Option<T>>(method, params)
            .await?
            .ok_or_else(|| RpcClientError::NotFound {
                kind,
                id: id.to_string(),
            })
    }

    /// Read-only contract call against the latest block
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcClientError> {
        debug!("eth_call to {} ({} bytes)", to, data.len());
        self.request(
            "eth_call",
            rpc_params![json!({ "to": to, "data": data }), "latest"],
        )
        .await
    }
}

/// Execute a request with retry logic using exponential backoff
/// Only retries on transport-level failures
async fn request_with_retry<F, Fut, T>(
    backoff: backoff::ExponentialBackoff,
    operation: F,
) -> Result<T, RpcClientError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, RpcClientError>>,
{
    use backoff::{future::retry_notify, Error};

    retry_notify(
        backoff,
        || async {
            match operation().await {
                Ok(result) => Ok(result),
                Err(err) => {
                    if is_retryable_error(&err) {
                        Err(Error::transient(err))
                    } else {
                        Err(Error::permanent(err))
                    }
                }
            }
        },
        |err, duration| {
            info!("Request failed, retrying in {:?}: {}", duration, err);
        },
    )
    .await
}

/// Determines if an error should be retried: transport errors and timeouts only
fn is_retryable_error(err: &RpcClientError) -> bool {
    match err {
        RpcClientError::RpcClient(rpc_err) => {
            use jsonrpsee::core::client::Error as RpcError;
            matches!(
                rpc_err,
                RpcError::Transport(_)
                    | RpcError::RequestTimeout
                    | RpcError::RestartNeeded(_)
                    | RpcError::ServiceDisconnect
            )
        }
        // JSON-RPC errors, null results and decoding failures are final
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_errors_are_retried() {
        use jsonrpsee::core::client::Error as RpcError;

        assert!(is_retryable_error(&RpcClientError::RpcClient(
            RpcError::RequestTimeout
        )));
        assert!(!is_retryable_error(&RpcClientError::NotFound {
            kind: "receipt",
            id: "0x01".into()
        }));
        assert!(!is_retryable_error(&RpcClientError::InvalidHeader));
    }

    #[tokio::test]
    async fn test_client_construction() {
        let client = EthRpcClient::new(
            "http://localhost:8545".to_string(),
            Some("user:pass".to_string()),
        );
        assert!(client.is_ok());
        assert!(EthRpcClient::new("not a url".to_string(), None).is_err());
    }
}
