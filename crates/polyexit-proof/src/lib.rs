//! Polygon PoS bridge exit proofs
//!
//! This crate builds the proof payload consumed by the root chain `exit(bytes)` call for a
//! burn transaction on the child chain: it locates the checkpoint containing the burn block,
//! proves block inclusion in that checkpoint, proves receipt inclusion in the block, picks
//! the burn log and encodes everything canonically.
//!
//! Chain access goes through the [`ChildChainReader`], [`RootChainReader`] and [`ProofApi`]
//! traits, so the engine itself performs no I/O.

pub mod chain;
pub mod checkpoint;
pub mod error;
pub mod event_log;
pub mod exit;
pub mod fast_proof;
pub mod merkle;
pub mod payload;
pub mod receipt;
pub mod types;

pub use chain::{ChildChainReader, ProofApi, RootChainReader};
pub use checkpoint::{CheckpointLocator, CHECKPOINT_INTERVAL};
pub use error::{ExitProofError, ProofApiError};
pub use event_log::{EventLogLocator, EventSignature};
pub use exit::{ExitPayloadBuilder, ProofStrategy, DEFAULT_RECEIPT_CONCURRENCY};
pub use fast_proof::{recursive_zero_hash, FastMerkleProofBuilder};
pub use merkle::{MerkleTree, MerkleTreeError, MAX_TREE_DEPTH};
pub use payload::{exit_hash, ExitPayload, ExitPayloadFields};
pub use receipt::{ReceiptProofValue, ReceiptTrieProof, ReceiptTrieProofBuilder};
pub use types::{
    BlockWithTransactions, ChainBlockInfo, CheckpointRange, HeaderBlock, Log, TransactionInfo,
    TransactionReceipt,
};
