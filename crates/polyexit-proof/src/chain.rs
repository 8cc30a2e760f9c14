//! Read access to the two chains and to the optional proof API.

use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;

use crate::error::ProofApiError;
use crate::types::{
    BlockWithTransactions, CheckpointRange, HeaderBlock, TransactionInfo, TransactionReceipt,
};

/// Child chain (Bor) reads
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChildChainReader: Send + Sync {
    async fn get_transaction(&self, hash: B256) -> anyhow::Result<TransactionInfo>;

    async fn get_transaction_receipt(&self, hash: B256) -> anyhow::Result<TransactionReceipt>;

    async fn get_block_with_transactions(
        &self,
        block_number: u64,
    ) -> anyhow::Result<BlockWithTransactions>;

    /// Merkle root of the block leaves in the inclusive range `[start_block, end_block]`
    /// (`eth_getRootHash`)
    async fn get_root_hash(&self, start_block: u64, end_block: u64) -> anyhow::Result<B256>;
}

/// Root chain contract reads
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RootChainReader: Send + Sync {
    /// `RootChain.getLastChildBlock()`
    async fn get_last_child_block(&self) -> anyhow::Result<u64>;

    /// `RootChain.currentHeaderBlock()`
    async fn current_header_block(&self) -> anyhow::Result<u64>;

    /// `RootChain.headerBlocks(key)`
    async fn header_block(&self, header_block_number: u64) -> anyhow::Result<HeaderBlock>;

    /// `RootChainManager.processedExits(exitHash)`
    async fn is_exit_processed(&self, exit_hash: B256) -> anyhow::Result<bool>;
}

/// Remote proof-assistance service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProofApi: Send + Sync {
    /// Checkpoint that includes the given child block
    async fn get_block_included(&self, block_number: u64)
        -> Result<CheckpointRange, ProofApiError>;

    /// Concatenated block inclusion proof for `block_number` within `[start, end]`
    async fn get_fast_merkle_proof(
        &self,
        start: u64,
        end: u64,
        block_number: u64,
    ) -> Result<Bytes, ProofApiError>;
}
