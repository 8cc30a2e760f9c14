use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use polyexit_proof::{HeaderBlock, RootChainReader};
use tracing::debug;

use crate::contracts::{IRootChain, IRootChainManager};
use crate::{EthRpcClient, RpcClientError};

/// Root chain contract reads through `eth_call`
#[derive(Debug)]
pub struct RootChainClient {
    rpc: EthRpcClient,
    root_chain: Address,
    root_chain_manager: Address,
}

impl RootChainClient {
    pub fn new(rpc: EthRpcClient, root_chain: Address, root_chain_manager: Address) -> Self {
        Self {
            rpc,
            root_chain,
            root_chain_manager,
        }
    }

    pub fn root_chain(&self) -> Address {
        self.root_chain
    }

    pub fn root_chain_manager(&self) -> Address {
        self.root_chain_manager
    }

    async fn call<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return, RpcClientError> {
        let output = self.rpc.call(to, call.abi_encode().into()).await?;
        C::abi_decode_returns(&output).map_err(Into::into)
    }

    /// Get the last child block covered by a checkpoint
    pub async fn last_child_block(&self) -> Result<u64, RpcClientError> {
        let block = self
            .call(self.root_chain, IRootChain::getLastChildBlockCall {})
            .await?;
        to_u64(block, "last child block")
    }

    /// Get the key of the next checkpoint
    pub async fn current_header_block(&self) -> Result<u64, RpcClientError> {
        let key = self
            .call(self.root_chain, IRootChain::currentHeaderBlockCall {})
            .await?;
        to_u64(key, "current header block")
    }

    /// Get the checkpoint stored under `header_block_number`
    pub async fn header_block(
        &self,
        header_block_number: u64,
    ) -> Result<HeaderBlock, RpcClientError> {
        let header = self
            .call(
                self.root_chain,
                IRootChain::headerBlocksCall {
                    headerBlockId: U256::from(header_block_number),
                },
            )
            .await?;
        debug!(
            "Header block {}: [{}, {}]",
            header_block_number, header.start, header.end
        );
        Ok(HeaderBlock {
            root: header.root,
            start: to_u64(header.start, "checkpoint start")?,
            end: to_u64(header.end, "checkpoint end")?,
            created_at: to_u64(header.createdAt, "checkpoint creation time")?,
            proposer: header.proposer,
        })
    }

    /// Check whether an exit has been processed by the RootChainManager
    pub async fn processed_exit(&self, exit_hash: B256) -> Result<bool, RpcClientError> {
        self.call(
            self.root_chain_manager,
            IRootChainManager::processedExitsCall { exitHash: exit_hash },
        )
        .await
    }
}

fn to_u64(value: U256, what: &str) -> Result<u64, RpcClientError> {
    u64::try_from(value)
        .map_err(|_| RpcClientError::InvalidResponse(format!("{what} {value} exceeds u64")))
}

#[async_trait]
impl RootChainReader for RootChainClient {
    async fn get_last_child_block(&self) -> anyhow::Result<u64> {
        Ok(self.last_child_block().await?)
    }

    async fn current_header_block(&self) -> anyhow::Result<u64> {
        Ok(RootChainClient::current_header_block(self).await?)
    }

    async fn header_block(&self, header_block_number: u64) -> anyhow::Result<HeaderBlock> {
        Ok(RootChainClient::header_block(self, header_block_number).await?)
    }

    async fn is_exit_processed(&self, exit_hash: B256) -> anyhow::Result<bool> {
        Ok(self.processed_exit(exit_hash).await?)
    }
}
