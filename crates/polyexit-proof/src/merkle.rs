//! Binary Keccak Merkle tree over checkpointed block leaves.
//!
//! Leaves are padded with zero hashes up to the next power of two, and every parent node is
//! `keccak256(left || right)`. Proofs list sibling hashes from the leaf level upward.

use alloy_primitives::{Keccak256, B256};
use thiserror::Error;

/// Deepest tree the root chain contracts accept
pub const MAX_TREE_DEPTH: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleTreeError {
    /// A tree needs at least one leaf
    #[error("At least one leaf is required")]
    EmptyLeaves,
    /// The padded tree would be deeper than the contracts allow
    #[error("Tree depth {depth} exceeds the maximum of {MAX_TREE_DEPTH}")]
    DepthExceeded { depth: usize },
}

#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// Layers from the padded leaves (first) to the root (last)
    layers: Vec<Vec<B256>>,
}

impl MerkleTree {
    pub fn new(leaves: Vec<B256>) -> Result<Self, MerkleTreeError> {
        if leaves.is_empty() {
            return Err(MerkleTreeError::EmptyLeaves);
        }
        let depth = tree_depth(leaves.len());
        if depth > MAX_TREE_DEPTH {
            return Err(MerkleTreeError::DepthExceeded { depth });
        }

        let mut current = leaves;
        current.resize(1 << depth, B256::ZERO);

        let mut layers = Vec::with_capacity(depth + 1);
        while current.len() > 1 {
            let next = current
                .chunks_exact(2)
                .map(|pair| hash_pair(&pair[0], &pair[1]))
                .collect();
            layers.push(std::mem::replace(&mut current, next));
        }
        layers.push(current);

        Ok(Self { layers })
    }

    pub fn root(&self) -> B256 {
        self.layers[self.layers.len() - 1][0]
    }

    /// Number of levels above the leaves
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Padded leaves
    pub fn leaves(&self) -> &[B256] {
        &self.layers[0]
    }

    /// Sibling path for `leaf`, empty if the leaf is absent.
    ///
    /// A leaf stored more than once is proven at its lowest index.
    pub fn get_proof(&self, leaf: &B256) -> Vec<B256> {
        match self.leaves().iter().position(|l| l == leaf) {
            Some(index) => self.get_proof_by_index(index),
            None => Vec::new(),
        }
    }

    /// Sibling path for the leaf at `index`, empty if out of range
    pub fn get_proof_by_index(&self, index: usize) -> Vec<B256> {
        if index >= self.leaves().len() {
            return Vec::new();
        }
        let mut proof = Vec::with_capacity(self.depth());
        let mut position = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            proof.push(layer[position ^ 1]);
            position /= 2;
        }
        proof
    }

    /// Check a sibling path for `value` at `index` against `root`.
    ///
    /// Returns false for malformed input instead of failing: a 32-byte `value` is required,
    /// and `index` must fit into a tree of `proof.len()` levels.
    pub fn verify(value: &[u8], index: usize, root: &[u8], proof: &[B256]) -> bool {
        if value.len() != 32 || root.len() != 32 {
            return false;
        }
        if proof.len() < usize::BITS as usize && index >> proof.len() != 0 {
            return false;
        }

        let mut hash = B256::from_slice(value);
        let mut position = index;
        for sibling in proof {
            hash = if position % 2 == 0 {
                hash_pair(&hash, sibling)
            } else {
                hash_pair(sibling, &hash)
            };
            position /= 2;
        }
        hash.as_slice() == root
    }
}

/// `keccak256(left || right)`
pub fn hash_pair(left: &B256, right: &B256) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize()
}

/// Depth of the smallest power-of-two tree holding `leaf_count` leaves
pub fn tree_depth(leaf_count: usize) -> usize {
    match leaf_count.checked_next_power_of_two() {
        Some(size) => size.trailing_zeros() as usize,
        None => usize::BITS as usize,
    }
}
