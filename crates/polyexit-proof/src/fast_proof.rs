//! Block inclusion proof against a checkpoint root, built from sub-range roots.
//!
//! Rather than fetching every block of a checkpoint, the builder asks the child chain for the
//! roots of the subtrees that are siblings of the target's path (`eth_getRootHash`). Subtrees
//! lying entirely in the zero padding are filled in locally.

use alloy_primitives::{Bytes, B256};
use tracing::debug;

use crate::chain::ChildChainReader;
use crate::error::ExitProofError;
use crate::merkle::{hash_pair, tree_depth, MerkleTree, MerkleTreeError, MAX_TREE_DEPTH};

/// Root of a complete tree of the given height whose leaves are all zero
pub fn recursive_zero_hash(height: usize) -> B256 {
    (0..height).fold(B256::ZERO, |hash, _| hash_pair(&hash, &hash))
}

pub struct FastMerkleProofBuilder<'a> {
    child_chain: &'a dyn ChildChainReader,
}

impl<'a> FastMerkleProofBuilder<'a> {
    pub fn new(child_chain: &'a dyn ChildChainReader) -> Self {
        Self { child_chain }
    }

    /// Sibling hashes proving `block_number` within the checkpoint `[start_block, end_block]`,
    /// ordered leaf level first.
    ///
    /// The result equals `MerkleTree::get_proof` over the full range of block leaves.
    pub async fn get_fast_merkle_proof(
        &self,
        block_number: u64,
        start_block: u64,
        end_block: u64,
    ) -> Result<Vec<B256>, ExitProofError> {
        if start_block > end_block || block_number < start_block || block_number > end_block {
            return Err(ExitProofError::BlockOutOfRange {
                block_number,
                start: start_block,
                end: end_block,
            });
        }

        let depth = tree_depth(leaf_count(start_block, end_block));
        if depth > MAX_TREE_DEPTH {
            return Err(MerkleTreeError::DepthExceeded { depth }.into());
        }

        // Positions are relative to the first block of the checkpoint
        let offset = start_block;
        let target = block_number - offset;
        let mut left = 0u64;
        let mut right = end_block - offset;

        let mut reversed_proof = Vec::with_capacity(depth);
        for level in 0..depth {
            let subtree_leaves = 1u64 << (depth - level);
            let pivot = left + subtree_leaves / 2 - 1;

            if target > pivot {
                // Left half is fully populated
                let root = self
                    .child_chain
                    .get_root_hash(offset + left, offset + pivot)
                    .await?;
                reversed_proof.push(root);
                left = pivot + 1;
            } else {
                let expected_height = depth - (level + 1);
                let sibling = if right <= pivot {
                    recursive_zero_hash(expected_height)
                } else {
                    self.padded_range_root(offset + pivot + 1, offset + right, expected_height)
                        .await?
                };
                reversed_proof.push(sibling);
                right = right.min(pivot);
            }
        }

        debug!(
            "Fast merkle proof for block {} in [{}, {}] has {} nodes",
            block_number, start_block, end_block, depth
        );
        reversed_proof.reverse();
        Ok(reversed_proof)
    }

    /// Concatenated 32-byte proof nodes as carried in the exit payload
    pub async fn build_block_proof(
        &self,
        block_number: u64,
        start_block: u64,
        end_block: u64,
    ) -> Result<Bytes, ExitProofError> {
        let proof = self
            .get_fast_merkle_proof(block_number, start_block, end_block)
            .await?;
        Ok(concat_proof(&proof))
    }

    /// Root of a subtree of `height` whose populated leaves are `[start, end]`, the rest zero
    async fn padded_range_root(
        &self,
        start: u64,
        end: u64,
        height: usize,
    ) -> Result<B256, ExitProofError> {
        let remaining = self.child_chain.get_root_hash(start, end).await?;
        let populated_height = tree_depth(leaf_count(start, end));
        let height_difference = height - populated_height;
        if height_difference == 0 {
            return Ok(remaining);
        }

        let mut leaves = vec![recursive_zero_hash(populated_height); 1 << height_difference];
        leaves[0] = remaining;
        Ok(MerkleTree::new(leaves)?.root())
    }
}

pub fn concat_proof(proof: &[B256]) -> Bytes {
    proof
        .iter()
        .flat_map(|node| node.0)
        .collect::<Vec<u8>>()
        .into()
}

fn leaf_count(start: u64, end: u64) -> usize {
    usize::try_from(end - start + 1).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockWithTransactions, TransactionInfo, TransactionReceipt};
    use alloy_primitives::keccak256;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves range roots computed from synthetic block leaves
    struct RangeRoots {
        first_block: u64,
        leaves: Vec<B256>,
        calls: AtomicUsize,
    }

    impl RangeRoots {
        fn new(first_block: u64, count: u64) -> Self {
            let leaves = (first_block..first_block + count)
                .map(|n| keccak256(n.to_be_bytes()))
                .collect();
            Self {
                first_block,
                leaves,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChildChainReader for RangeRoots {
        async fn get_transaction(&self, _hash: B256) -> anyhow::Result<TransactionInfo> {
            unimplemented!()
        }

        async fn get_transaction_receipt(&self, _hash: B256) -> anyhow::Result<TransactionReceipt> {
            unimplemented!()
        }

        async fn get_block_with_transactions(
            &self,
            _block_number: u64,
        ) -> anyhow::Result<BlockWithTransactions> {
            unimplemented!()
        }

        async fn get_root_hash(&self, start_block: u64, end_block: u64) -> anyhow::Result<B256> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let from = (start_block - self.first_block) as usize;
            let to = (end_block - self.first_block) as usize;
            Ok(MerkleTree::new(self.leaves[from..=to].to_vec())?.root())
        }
    }

    #[test]
    fn test_zero_hashes() {
        assert_eq!(recursive_zero_hash(0), B256::ZERO);
        assert_eq!(recursive_zero_hash(1), hash_pair(&B256::ZERO, &B256::ZERO));
        let two = recursive_zero_hash(2);
        assert_eq!(two, hash_pair(&recursive_zero_hash(1), &recursive_zero_hash(1)));
        assert_eq!(
            MerkleTree::new(vec![B256::ZERO; 8]).unwrap().root(),
            recursive_zero_hash(3)
        );
    }

    #[tokio::test]
    async fn test_matches_full_tree_proof() {
        for count in [1u64, 2, 3, 5, 8, 13, 16, 17, 31] {
            let first_block = 1_000;
            let chain = RangeRoots::new(first_block, count);
            let tree = MerkleTree::new(chain.leaves.clone()).unwrap();
            let builder = FastMerkleProofBuilder::new(&chain);

            for position in 0..count {
                let block = first_block + position;
                let proof = builder
                    .get_fast_merkle_proof(block, first_block, first_block + count - 1)
                    .await
                    .unwrap();
                assert_eq!(
                    proof,
                    tree.get_proof_by_index(position as usize),
                    "block {position} of {count}"
                );
                assert!(MerkleTree::verify(
                    chain.leaves[position as usize].as_slice(),
                    position as usize,
                    tree.root().as_slice(),
                    &proof
                ));
            }
        }
    }

    #[tokio::test]
    async fn test_round_trips_bounded_by_depth() {
        let chain = RangeRoots::new(0, 100);
        let builder = FastMerkleProofBuilder::new(&chain);
        builder.get_fast_merkle_proof(37, 0, 99).await.unwrap();
        assert!(chain.calls.load(Ordering::SeqCst) <= tree_depth(100));
    }

    #[tokio::test]
    async fn test_single_block_checkpoint() {
        let chain = RangeRoots::new(42, 1);
        let builder = FastMerkleProofBuilder::new(&chain);
        let proof = builder.build_block_proof(42, 42, 42).await.unwrap();
        assert!(proof.is_empty());
        assert_eq!(chain.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_block_proof_is_concatenated() {
        let chain = RangeRoots::new(0, 6);
        let builder = FastMerkleProofBuilder::new(&chain);
        let nodes = builder.get_fast_merkle_proof(4, 0, 5).await.unwrap();
        let proof = builder.build_block_proof(4, 0, 5).await.unwrap();
        assert_eq!(proof.len(), 32 * nodes.len());
        assert_eq!(&proof[32..64], nodes[1].as_slice());
    }

    #[tokio::test]
    async fn test_rejects_block_outside_range() {
        let chain = RangeRoots::new(0, 4);
        let builder = FastMerkleProofBuilder::new(&chain);
        let err = builder.get_fast_merkle_proof(9, 0, 3).await.unwrap_err();
        assert!(matches!(err, ExitProofError::BlockOutOfRange { .. }));
    }

    #[tokio::test]
    async fn test_rejects_oversized_checkpoint() {
        let chain = RangeRoots::new(0, 1);
        let builder = FastMerkleProofBuilder::new(&chain);
        let err = builder
            .get_fast_merkle_proof(0, 0, 1 << MAX_TREE_DEPTH)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExitProofError::MerkleTree(MerkleTreeError::DepthExceeded { depth: 21 })
        ));
    }
}
