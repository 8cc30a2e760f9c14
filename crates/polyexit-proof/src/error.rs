//! Error types of the exit proof engine.

use alloy_primitives::B256;
use thiserror::Error;

use crate::merkle::MerkleTreeError;

/// Errors returned by exit proof construction
#[derive(Error, Debug)]
pub enum ExitProofError {
    /// The burn block is not covered by a checkpoint yet, poll and retry later
    #[error(
        "Burn transaction block {tx_block_number} has not been checkpointed as yet (last child block {last_child_block})"
    )]
    NotCheckpointed {
        tx_block_number: u64,
        last_child_block: u64,
    },
    /// No log in the receipt matches the event signature at the requested position
    #[error(
        "Log not found in receipt for event signature {signature}{}",
        .index.map(|i| format!(" at index {i}")).unwrap_or_default()
    )]
    LogNotFound {
        signature: B256,
        index: Option<usize>,
    },
    /// The caller asked for the proof API but none is configured
    #[error("Proof API is not configured")]
    ProofServiceNotConfigured,
    /// The target receipt could not be reached in the receipts trie
    #[error("Receipt trie traversal failed: {0}")]
    TrieTraversalFailed(String),
    #[error(transparent)]
    MerkleTree(#[from] MerkleTreeError),
    /// No committed checkpoint contains the child block
    #[error("No checkpoint contains child block {block_number}")]
    CheckpointNotFound { block_number: u64 },
    #[error("Block {block_number} is outside of checkpoint range [{start}, {end}]")]
    BlockOutOfRange {
        block_number: u64,
        start: u64,
        end: u64,
    },
    #[error("Transaction {0} is not included in a block yet")]
    TransactionPending(B256),
    /// Chain client failures, propagated unchanged
    #[error(transparent)]
    Chain(#[from] anyhow::Error),
}

impl ExitProofError {
    /// Whether retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExitProofError::NotCheckpointed { .. } | ExitProofError::TransactionPending(_)
        )
    }
}

/// Errors returned by the remote proof API
#[derive(Error, Debug)]
pub enum ProofApiError {
    /// No proof API endpoint is configured; never falls back
    #[error("Proof API is not configured")]
    NotConfigured,
    #[error("Proof API request failed: {0}")]
    Request(anyhow::Error),
    #[error("Invalid proof API response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        let not_checkpointed = ExitProofError::NotCheckpointed {
            tx_block_number: 10,
            last_child_block: 5,
        };
        assert!(not_checkpointed.is_retryable());
        assert!(!ExitProofError::ProofServiceNotConfigured.is_retryable());
        assert!(!ExitProofError::TrieTraversalFailed("missing".into()).is_retryable());
        assert!(!ExitProofError::MerkleTree(MerkleTreeError::DepthExceeded { depth: 21 })
            .is_retryable());
    }

    #[test]
    fn test_log_not_found_message() {
        let err = ExitProofError::LogNotFound {
            signature: B256::ZERO,
            index: Some(3),
        };
        assert!(err.to_string().ends_with("at index 3"));

        let err = ExitProofError::LogNotFound {
            signature: B256::ZERO,
            index: None,
        };
        assert!(!err.to_string().contains("at index"));
    }
}
