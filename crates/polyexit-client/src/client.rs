//! Exit client connected to live root and child chain nodes.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use polyexit_proof::{ExitPayload, ExitPayloadBuilder, ExitProofError};
use polyexit_rpc_client::contracts::IRootChainManager;
use polyexit_rpc_client::{ChildChainClient, EthRpcClient, RootChainClient};
use tracing::info;

use crate::config::PosBridgeConfig;
use crate::network_config::{NetworkConfigCache, ROOT_CHAIN_MANAGER_PATH, ROOT_CHAIN_PATH};
use crate::proof_api::ProofApiClient;
use crate::token::{BridgeToken, ExitKind};

/// Exit payloads, exit hashes and checkpoint status for burns on the child chain
pub struct PosExitClient {
    builder: ExitPayloadBuilder,
    root_chain: Address,
    root_chain_manager: Address,
}

impl PosExitClient {
    pub fn new(
        builder: ExitPayloadBuilder,
        root_chain: Address,
        root_chain_manager: Address,
    ) -> Self {
        Self {
            builder,
            root_chain,
            root_chain_manager,
        }
    }

    /// Validate `config`, resolve missing contract addresses from the address index
    /// and set up the RPC and proof API clients
    pub async fn connect(
        config: &PosBridgeConfig,
        network_config: &NetworkConfigCache,
    ) -> Result<Self, anyhow::Error> {
        config.validate()?;

        let root_chain = match config.root_chain {
            Some(address) => address,
            None => {
                network_config
                    .get_address(config.network, &config.version, ROOT_CHAIN_PATH)
                    .await?
            }
        };
        let root_chain_manager = match config.root_chain_manager {
            Some(address) => address,
            None => {
                network_config
                    .get_address(config.network, &config.version, ROOT_CHAIN_MANAGER_PATH)
                    .await?
            }
        };

        let parent_rpc = EthRpcClient::with_timeout(
            config.parent.url.clone(),
            config.parent.userpwd.clone(),
            config.request_timeout,
        )?;
        let child_rpc = EthRpcClient::with_timeout(
            config.child.url.clone(),
            config.child.userpwd.clone(),
            config.request_timeout,
        )?;

        let mut builder = ExitPayloadBuilder::new(
            Arc::new(ChildChainClient::new(child_rpc)),
            Arc::new(RootChainClient::new(
                parent_rpc,
                root_chain,
                root_chain_manager,
            )),
        )
        .with_receipt_concurrency(config.receipt_concurrency);
        if let Some(proof_api_url) = &config.proof_api_url {
            builder = builder.with_proof_api(Arc::new(ProofApiClient::new(
                proof_api_url.clone(),
                config.network,
                config.request_timeout,
            )?));
        }

        info!(
            "Connected to {} {} (RootChainProxy {}, RootChainManagerProxy {})",
            config.network, config.version, root_chain, root_chain_manager
        );
        Ok(Self::new(builder, root_chain, root_chain_manager))
    }

    pub fn root_chain(&self) -> Address {
        self.root_chain
    }

    /// Destination of exit transactions
    pub fn root_chain_manager(&self) -> Address {
        self.root_chain_manager
    }

    pub fn has_proof_api(&self) -> bool {
        self.builder.has_proof_api()
    }

    pub async fn is_checkpointed(&self, burn_tx_hash: B256) -> Result<bool, ExitProofError> {
        self.builder.is_checkpointed(burn_tx_hash).await
    }

    pub async fn build_payload_for_exit(
        &self,
        burn_tx_hash: B256,
        index: usize,
        event_signature: B256,
        use_proof_api: bool,
    ) -> Result<ExitPayload, ExitProofError> {
        self.builder
            .build_payload_for_exit(burn_tx_hash, index, event_signature, use_proof_api)
            .await
    }

    pub async fn build_multiple_payloads_for_exit(
        &self,
        burn_tx_hash: B256,
        event_signature: B256,
        use_proof_api: bool,
    ) -> Result<Vec<ExitPayload>, ExitProofError> {
        self.builder
            .build_multiple_payloads_for_exit(burn_tx_hash, event_signature, use_proof_api)
            .await
    }

    pub async fn get_exit_hash(
        &self,
        burn_tx_hash: B256,
        index: usize,
        event_signature: B256,
    ) -> Result<B256, ExitProofError> {
        self.builder
            .get_exit_hash(burn_tx_hash, index, event_signature)
            .await
    }

    pub async fn is_exit_processed(
        &self,
        burn_tx_hash: B256,
        index: usize,
        event_signature: B256,
    ) -> Result<bool, ExitProofError> {
        self.builder
            .is_exit_processed(burn_tx_hash, index, event_signature)
            .await
    }

    /// Exit payload of a token withdrawal
    pub async fn withdraw_exit_payload(
        &self,
        token: &BridgeToken,
        burn_tx_hash: B256,
        kind: ExitKind,
        index: usize,
        use_proof_api: bool,
    ) -> Result<ExitPayload, anyhow::Error> {
        let signature = token.exit_signature(kind)?;
        Ok(self
            .builder
            .build_payload_for_exit(burn_tx_hash, index, signature, use_proof_api)
            .await?)
    }

    /// Whether a token withdrawal has already been exited
    pub async fn is_withdraw_exited(
        &self,
        token: &BridgeToken,
        burn_tx_hash: B256,
        kind: ExitKind,
        index: usize,
    ) -> Result<bool, anyhow::Error> {
        let signature = token.exit_signature(kind)?;
        Ok(self
            .builder
            .is_exit_processed(burn_tx_hash, index, signature)
            .await?)
    }
}

/// Call data of `RootChainManager.exit(payload)`
pub fn exit_calldata(payload: &ExitPayload) -> Bytes {
    IRootChainManager::exitCall {
        inputData: payload.as_bytes().clone(),
    }
    .abi_encode()
    .into()
}
