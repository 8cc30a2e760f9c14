//! Canonical receipt encoding and receipts-trie inclusion proofs.

use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};
use alloy_trie::proof::{verify_proof, ProofRetainer};
use alloy_trie::{HashBuilder, Nibbles};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::chain::ChildChainReader;
use crate::error::ExitProofError;
use crate::types::{BlockWithTransactions, Log, TransactionReceipt};

/// Domain prefix of the synthetic state-sync transaction hash
const STATE_SYNC_RECEIPT_PREFIX: &[u8] = b"matic-bor-receipt-";

/// RLP body of a receipt: `[status_or_root, cumulative_gas_used, logs_bloom, logs]`
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct ReceiptFields {
    /// `0x01` on success, empty on failure, or the legacy intermediate state root
    pub status_or_root: Bytes,
    pub cumulative_gas_used: u64,
    pub logs_bloom: Bloom,
    pub logs: Vec<LogFields>,
}

/// RLP body of a log: `[address, topics, data]`
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct LogFields {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl From<&Log> for LogFields {
    fn from(log: &Log) -> Self {
        Self {
            address: log.address,
            topics: log.topics.clone(),
            data: log.data.clone(),
        }
    }
}

impl From<&TransactionReceipt> for ReceiptFields {
    fn from(receipt: &TransactionReceipt) -> Self {
        let status_or_root = match (receipt.status, receipt.root) {
            (Some(true), _) => Bytes::from_static(&[0x01]),
            (Some(false), _) => Bytes::new(),
            (None, Some(root)) => Bytes::copy_from_slice(root.as_slice()),
            (None, None) => Bytes::new(),
        };
        Self {
            status_or_root,
            cumulative_gas_used: receipt.cumulative_gas_used,
            logs_bloom: receipt.logs_bloom,
            logs: receipt.logs.iter().map(LogFields::from).collect(),
        }
    }
}

/// Typed (EIP-2718) receipts are prefixed with their type byte in the trie
pub fn is_typed_receipt(receipt: &TransactionReceipt) -> bool {
    receipt.status.is_some() && receipt.tx_type.is_some_and(|tx_type| tx_type != 0)
}

/// Receipt bytes as stored in the receipts trie
pub fn encode_receipt(receipt: &TransactionReceipt) -> Bytes {
    let fields = ReceiptFields::from(receipt);
    let mut out = Vec::with_capacity(fields.length() + 1);
    if is_typed_receipt(receipt) {
        out.extend(receipt.tx_type);
    }
    fields.encode(&mut out);
    out.into()
}

/// Trie key of the receipt at `transaction_index`: `rlp(transaction_index)`
pub fn receipt_trie_key(transaction_index: u64) -> Bytes {
    alloy_rlp::encode(transaction_index).into()
}

/// Hash of the synthetic state-sync transaction Bor appends to a block.
///
/// Its receipt is not part of the receipts trie.
pub fn state_sync_tx_hash(block: &BlockWithTransactions) -> B256 {
    let mut preimage =
        Vec::with_capacity(STATE_SYNC_RECEIPT_PREFIX.len() + 8 + B256::len_bytes());
    preimage.extend_from_slice(STATE_SYNC_RECEIPT_PREFIX);
    preimage.extend_from_slice(&block.number.to_be_bytes());
    preimage.extend_from_slice(block.hash.as_slice());
    keccak256(preimage)
}

/// Proven receipt value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptProofValue {
    /// Type byte followed by the RLP body
    Typed(Bytes),
    Legacy(ReceiptFields),
}

/// Inclusion proof of one receipt in a block's receipts trie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptTrieProof {
    pub block_hash: B256,
    /// Receipts root of the block header
    pub root: B256,
    /// Trie key, `rlp(transaction_index)`
    pub path: Bytes,
    /// RLP-encoded trie nodes from the root down to the leaf
    pub parent_nodes: Vec<Bytes>,
    pub value: ReceiptProofValue,
}

pub struct ReceiptTrieProofBuilder<'a> {
    child_chain: &'a dyn ChildChainReader,
    concurrency: usize,
}

impl<'a> ReceiptTrieProofBuilder<'a> {
    pub fn new(child_chain: &'a dyn ChildChainReader, concurrency: usize) -> Self {
        Self {
            child_chain,
            concurrency: concurrency.max(1),
        }
    }

    /// Rebuild the receipts trie of `block` and prove `receipt` in it
    pub async fn get_receipt_proof(
        &self,
        receipt: &TransactionReceipt,
        block: &BlockWithTransactions,
    ) -> Result<ReceiptTrieProof, ExitProofError> {
        let receipts = self.fetch_block_receipts(block).await?;
        build_receipt_proof(receipt, block, &receipts)
    }

    /// Receipts of every transaction of the block except the state-sync one, with at most
    /// `concurrency` requests in flight
    async fn fetch_block_receipts(
        &self,
        block: &BlockWithTransactions,
    ) -> Result<Vec<TransactionReceipt>, ExitProofError> {
        let state_sync_hash = state_sync_tx_hash(block);
        let hashes: Vec<B256> = block
            .transactions
            .iter()
            .copied()
            .filter(|hash| *hash != state_sync_hash)
            .collect();
        debug!(
            "Fetching {} receipts of block {}",
            hashes.len(),
            block.number
        );

        let receipts: Vec<TransactionReceipt> = stream::iter(hashes)
            .map(|hash| self.child_chain.get_transaction_receipt(hash))
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;
        Ok(receipts)
    }
}

/// Receipts trie entries sorted by key, one per transaction index
fn trie_entries(receipts: &[TransactionReceipt]) -> Vec<(Nibbles, Bytes)> {
    let mut entries: Vec<(Nibbles, Bytes)> = receipts
        .iter()
        .map(|r| {
            (
                Nibbles::unpack(receipt_trie_key(r.transaction_index)),
                encode_receipt(r),
            )
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.dedup_by(|a, b| a.0 == b.0);
    entries
}

/// Root of the receipts trie holding `receipts`
pub fn receipts_trie_root(receipts: &[TransactionReceipt]) -> B256 {
    let mut builder = HashBuilder::default();
    for (key, leaf) in &trie_entries(receipts) {
        builder.add_leaf(*key, leaf);
    }
    builder.root()
}

/// Build the receipts trie from `receipts` and extract the proof for `receipt`.
///
/// A trie root different from the block header's receipts root is logged but not fatal.
pub fn build_receipt_proof(
    receipt: &TransactionReceipt,
    block: &BlockWithTransactions,
    receipts: &[TransactionReceipt],
) -> Result<ReceiptTrieProof, ExitProofError> {
    let entries = trie_entries(receipts);

    let path = receipt_trie_key(receipt.transaction_index);
    let target = Nibbles::unpack(&path);
    let value = entries
        .iter()
        .find(|(key, _)| *key == target)
        .map(|(_, value)| value.clone())
        .ok_or_else(|| {
            ExitProofError::TrieTraversalFailed(format!(
                "receipt at index {} is not among the {} receipts of block {}",
                receipt.transaction_index,
                entries.len(),
                block.number
            ))
        })?;

    let mut builder = HashBuilder::default().with_proof_retainer(ProofRetainer::new(vec![target]));
    for (key, leaf) in &entries {
        builder.add_leaf(*key, leaf);
    }
    let root = builder.root();
    let parent_nodes: Vec<Bytes> = builder
        .take_proof_nodes()
        .matching_nodes_sorted(&target)
        .into_iter()
        .map(|(_, node)| node)
        .collect();

    verify_proof(root, target, Some(value.to_vec()), &parent_nodes)
        .map_err(|e| ExitProofError::TrieTraversalFailed(e.to_string()))?;

    if root != block.receipts_root {
        warn!(
            "Rebuilt receipts root {} differs from block {} header root {}",
            root, block.number, block.receipts_root
        );
    }

    let value = if is_typed_receipt(receipt) {
        ReceiptProofValue::Typed(value)
    } else {
        let fields = ReceiptFields::decode(&mut value.as_ref())
            .map_err(|e| ExitProofError::TrieTraversalFailed(e.to_string()))?;
        ReceiptProofValue::Legacy(fields)
    };

    Ok(ReceiptTrieProof {
        block_hash: block.hash,
        root: block.receipts_root,
        path,
        parent_nodes,
        value,
    })
}
