//! HTTP client for the proof API, which answers checkpoint and block proof queries that
//! would otherwise take many root and child chain calls.

use std::time::Duration;

use alloy_primitives::Bytes;
use async_trait::async_trait;
use polyexit_proof::{CheckpointRange, ProofApi, ProofApiError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::Network;

/// Number that the service may send as a JSON number, a decimal string or a hex string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Quantity {
    Number(u64),
    Text(String),
}

impl Quantity {
    fn to_u64(&self, field: &str) -> Result<u64, ProofApiError> {
        let parsed = match self {
            Quantity::Number(value) => return Ok(*value),
            Quantity::Text(text) => match text.strip_prefix("0x") {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => text.parse(),
            },
        };
        parsed.map_err(|e| ProofApiError::InvalidResponse(format!("{field}: {e}")))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockIncludedResponse {
    header_block_number: Quantity,
    start: Quantity,
    end: Quantity,
}

#[derive(Debug, Deserialize)]
struct FastMerkleProofResponse {
    proof: Bytes,
}

/// Proof API client for one network
#[derive(Debug, Clone)]
pub struct ProofApiClient {
    base_url: String,
    network: Network,
    http: reqwest::Client,
}

impl ProofApiClient {
    pub fn new(
        base_url: impl Into<String>,
        network: Network,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            network,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.network.proof_api_network(),
            path
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ProofApiError> {
        debug!("Fetching {} ...", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ProofApiError::Request(e.into()))?;
        match response.error_for_status() {
            Ok(res) => res
                .json()
                .await
                .map_err(|e| ProofApiError::InvalidResponse(e.to_string())),
            Err(e) => Err(ProofApiError::Request(e.into())),
        }
    }
}

#[async_trait]
impl ProofApi for ProofApiClient {
    async fn get_block_included(
        &self,
        block_number: u64,
    ) -> Result<CheckpointRange, ProofApiError> {
        let response: BlockIncludedResponse = self
            .get_json(self.url(&format!("block-included/{block_number}")))
            .await?;
        Ok(CheckpointRange {
            header_block_number: response.header_block_number.to_u64("headerBlockNumber")?,
            start: response.start.to_u64("start")?,
            end: response.end.to_u64("end")?,
        })
    }

    async fn get_fast_merkle_proof(
        &self,
        start: u64,
        end: u64,
        block_number: u64,
    ) -> Result<Bytes, ProofApiError> {
        let response: FastMerkleProofResponse = self
            .get_json(self.url(&format!(
                "fast-merkle-proof?start={start}&end={end}&number={block_number}"
            )))
            .await?;
        Ok(response.proof)
    }
}
