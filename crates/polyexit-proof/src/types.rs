//! Chain data consumed by the proof engine and the values derived from it.

use alloy_primitives::{Address, Bloom, Bytes, B256};

/// Range of child chain blocks committed by a single checkpoint (header block)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointRange {
    /// Absolute checkpoint key as used by `headerBlocks` (index * checkpoint interval)
    pub header_block_number: u64,
    /// First child block of the checkpoint (inclusive)
    pub start: u64,
    /// Last child block of the checkpoint (inclusive)
    pub end: u64,
}

impl CheckpointRange {
    pub fn contains(&self, block_number: u64) -> bool {
        self.start <= block_number && block_number <= self.end
    }

    /// Number of child blocks in the range
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Checkpoint status of a burn transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainBlockInfo {
    /// Last child block committed to the root chain
    pub last_child_block: u64,
    /// Child block containing the burn transaction
    pub tx_block_number: u64,
}

impl ChainBlockInfo {
    pub fn is_checkpointed(&self) -> bool {
        self.last_child_block >= self.tx_block_number
    }
}

/// Checkpoint record as stored by the root chain contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderBlock {
    pub root: B256,
    pub start: u64,
    pub end: u64,
    pub created_at: u64,
    pub proposer: Address,
}

/// The part of a child chain transaction the engine needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInfo {
    pub hash: B256,
    /// `None` while the transaction is pending
    pub block_number: Option<u64>,
}

/// Event log entry of a receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Transaction receipt with everything needed for its canonical trie encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub transaction_index: u64,
    pub block_hash: B256,
    pub block_number: u64,
    /// Post-Byzantium execution status
    pub status: Option<bool>,
    /// Pre-Byzantium intermediate state root
    pub root: Option<B256>,
    /// EIP-2718 transaction type, absent on legacy nodes
    pub tx_type: Option<u8>,
    pub cumulative_gas_used: u64,
    pub logs_bloom: Bloom,
    pub logs: Vec<Log>,
}

/// Block header fields and the hashes of the transactions it contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockWithTransactions {
    pub number: u64,
    pub hash: B256,
    pub timestamp: u64,
    pub transactions_root: B256,
    pub receipts_root: B256,
    pub transactions: Vec<B256>,
}
