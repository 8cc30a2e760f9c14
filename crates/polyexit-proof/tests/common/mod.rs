//! In-memory child and root chain used by the integration tests.
//!
//! Block leaves are block hashes, checkpoint roots are real Merkle roots over them and
//! receipts roots are real receipts trie roots, so every proof can be checked end to end.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256};
use anyhow::{anyhow, Context};
use async_trait::async_trait;

use polyexit_proof::receipt::{receipts_trie_root, state_sync_tx_hash};
use polyexit_proof::{
    BlockWithTransactions, CheckpointRange, ChildChainReader, EventSignature, ExitPayloadBuilder,
    HeaderBlock, Log, MerkleTree, ProofApi, ProofApiError, RootChainReader, TransactionInfo,
    TransactionReceipt, CHECKPOINT_INTERVAL,
};

pub const TOKEN: Address = Address::repeat_byte(0x77);

pub struct FakeChain {
    blocks: BTreeMap<u64, BlockWithTransactions>,
    receipts: HashMap<B256, TransactionReceipt>,
    checkpoints: Vec<HeaderBlock>,
    last_child_block: u64,
    processed_exits: Mutex<HashSet<B256>>,
    pub root_hash_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    /// Receipt requests currently awaiting a response, and the most seen at once
    pub in_flight_receipts: AtomicUsize,
    pub peak_in_flight_receipts: AtomicUsize,
}

impl FakeChain {
    /// Contiguous checkpoints of the given sizes starting at block 0, all checkpointed
    pub fn new(checkpoint_sizes: &[u64]) -> Self {
        let block_count: u64 = checkpoint_sizes.iter().sum();
        let mut chain = Self {
            blocks: BTreeMap::new(),
            receipts: HashMap::new(),
            checkpoints: Vec::new(),
            last_child_block: block_count - 1,
            processed_exits: Mutex::new(HashSet::new()),
            root_hash_calls: AtomicUsize::new(0),
            receipt_calls: AtomicUsize::new(0),
            in_flight_receipts: AtomicUsize::new(0),
            peak_in_flight_receipts: AtomicUsize::new(0),
        };

        for number in 0..block_count {
            chain.add_block(number);
        }

        let mut start = 0;
        for size in checkpoint_sizes {
            let end = start + size - 1;
            let root = chain.range_root(start, end).expect("non-empty range");
            chain.checkpoints.push(HeaderBlock {
                root,
                start,
                end,
                created_at: 1_600_000_000 + end,
                proposer: Address::repeat_byte(0x99),
            });
            start = end + 1;
        }
        chain
    }

    /// Moves the last checkpointed block back, as if later checkpoints were not submitted yet
    pub fn with_last_child_block(mut self, last_child_block: u64) -> Self {
        self.last_child_block = last_child_block;
        self
    }

    /// Append a transaction with the given logs to `block_number`, returning its hash
    pub fn add_burn(&mut self, block_number: u64, logs: Vec<Log>) -> B256 {
        let block = self.blocks.get(&block_number).expect("known block").clone();
        let regular = block.transactions.len() as u64 - 1;
        let hash = keccak256(format!("burn-{block_number}-{regular}"));
        let receipt = receipt(&block, hash, regular, logs);
        self.receipts.insert(hash, receipt);

        let block = self.blocks.get_mut(&block_number).expect("known block");
        block.transactions.insert(regular as usize, hash);
        let receipts: Vec<TransactionReceipt> = block
            .transactions
            .iter()
            .filter_map(|tx| self.receipts.get(tx).cloned())
            .collect();
        block.receipts_root = receipts_trie_root(&receipts);
        hash
    }

    pub fn block(&self, number: u64) -> &BlockWithTransactions {
        &self.blocks[&number]
    }

    pub fn receipt(&self, hash: &B256) -> &TransactionReceipt {
        &self.receipts[hash]
    }

    pub fn checkpoint_for(&self, block_number: u64) -> (CheckpointRange, B256) {
        self.checkpoints
            .iter()
            .enumerate()
            .find(|(_, header)| header.start <= block_number && block_number <= header.end)
            .map(|(index, header)| {
                (
                    CheckpointRange {
                        header_block_number: (index as u64 + 1) * CHECKPOINT_INTERVAL,
                        start: header.start,
                        end: header.end,
                    },
                    header.root,
                )
            })
            .expect("checkpointed block")
    }

    pub fn mark_processed(&self, exit_hash: B256) {
        self.processed_exits.lock().unwrap().insert(exit_hash);
    }

    fn add_block(&mut self, number: u64) {
        let mut block = BlockWithTransactions {
            number,
            hash: keccak256(format!("block-{number}")),
            timestamp: 1_600_000_000 + 2 * number,
            transactions_root: keccak256(format!("transactions-{number}")),
            receipts_root: B256::ZERO,
            transactions: Vec::new(),
        };

        let mut receipts = Vec::new();
        for index in 0..(1 + number % 4) {
            let hash = keccak256(format!("tx-{number}-{index}"));
            let logs = vec![Log {
                address: TOKEN,
                topics: vec![
                    EventSignature::ERC20_TRANSFER,
                    B256::left_padding_from(&[index as u8 + 1]),
                    B256::left_padding_from(&[index as u8 + 2]),
                ],
                data: Bytes::from(vec![index as u8; 32]),
            }];
            receipts.push(receipt(&block, hash, index, logs));
            block.transactions.push(hash);
        }

        block.receipts_root = receipts_trie_root(&receipts);
        block.transactions.push(state_sync_tx_hash(&block));
        for receipt in receipts {
            self.receipts.insert(receipt.transaction_hash, receipt);
        }
        self.blocks.insert(number, block);
    }

    fn range_root(&self, start: u64, end: u64) -> anyhow::Result<B256> {
        let leaves = (start..=end)
            .map(|n| {
                self.blocks
                    .get(&n)
                    .map(|block| block.hash)
                    .ok_or_else(|| anyhow!("unknown block {n}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(MerkleTree::new(leaves)?.root())
    }
}

fn receipt(
    block: &BlockWithTransactions,
    hash: B256,
    index: u64,
    logs: Vec<Log>,
) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: hash,
        transaction_index: index,
        block_hash: block.hash,
        block_number: block.number,
        status: Some(true),
        root: None,
        // Mix legacy and typed receipts
        tx_type: Some(if index % 2 == 0 { 2 } else { 0 }),
        cumulative_gas_used: 50_000 * (index + 1),
        logs_bloom: Bloom::ZERO,
        logs,
    }
}

#[async_trait]
impl ChildChainReader for FakeChain {
    async fn get_transaction(&self, hash: B256) -> anyhow::Result<TransactionInfo> {
        let receipt = self
            .receipts
            .get(&hash)
            .with_context(|| format!("unknown transaction {hash}"))?;
        Ok(TransactionInfo {
            hash,
            block_number: Some(receipt.block_number),
        })
    }

    async fn get_transaction_receipt(&self, hash: B256) -> anyhow::Result<TransactionReceipt> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.in_flight_receipts.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight_receipts.fetch_max(in_flight, Ordering::SeqCst);
        // Stay pending for one poll so concurrent requests overlap
        tokio::task::yield_now().await;
        self.in_flight_receipts.fetch_sub(1, Ordering::SeqCst);

        self.receipts
            .get(&hash)
            .cloned()
            .with_context(|| format!("no receipt for {hash}"))
    }

    async fn get_block_with_transactions(
        &self,
        block_number: u64,
    ) -> anyhow::Result<BlockWithTransactions> {
        self.blocks
            .get(&block_number)
            .cloned()
            .with_context(|| format!("unknown block {block_number}"))
    }

    async fn get_root_hash(&self, start_block: u64, end_block: u64) -> anyhow::Result<B256> {
        self.root_hash_calls.fetch_add(1, Ordering::SeqCst);
        self.range_root(start_block, end_block)
    }
}

#[async_trait]
impl RootChainReader for FakeChain {
    async fn get_last_child_block(&self) -> anyhow::Result<u64> {
        Ok(self.last_child_block)
    }

    async fn current_header_block(&self) -> anyhow::Result<u64> {
        Ok(self.checkpoints.len() as u64 * CHECKPOINT_INTERVAL)
    }

    async fn header_block(&self, header_block_number: u64) -> anyhow::Result<HeaderBlock> {
        let index = (header_block_number / CHECKPOINT_INTERVAL) as usize;
        index
            .checked_sub(1)
            .and_then(|i| self.checkpoints.get(i))
            .copied()
            .with_context(|| format!("unknown header block {header_block_number}"))
    }

    async fn is_exit_processed(&self, exit_hash: B256) -> anyhow::Result<bool> {
        Ok(self.processed_exits.lock().unwrap().contains(&exit_hash))
    }
}

/// Proof API failing every request with a transport error
pub struct UnavailableProofApi {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ProofApi for UnavailableProofApi {
    async fn get_block_included(
        &self,
        _block_number: u64,
    ) -> Result<CheckpointRange, ProofApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProofApiError::Request(anyhow!("502 Bad Gateway")))
    }

    async fn get_fast_merkle_proof(
        &self,
        _start: u64,
        _end: u64,
        _block_number: u64,
    ) -> Result<Bytes, ProofApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProofApiError::Request(anyhow!("502 Bad Gateway")))
    }
}

/// Proof API answering from the fake chain
pub struct ChainProofApi {
    pub chain: Arc<FakeChain>,
}

#[async_trait]
impl ProofApi for ChainProofApi {
    async fn get_block_included(&self, block_number: u64) -> Result<CheckpointRange, ProofApiError> {
        Ok(self.chain.checkpoint_for(block_number).0)
    }

    async fn get_fast_merkle_proof(
        &self,
        start: u64,
        end: u64,
        block_number: u64,
    ) -> Result<Bytes, ProofApiError> {
        let leaves: Vec<B256> = (start..=end).map(|n| self.chain.block(n).hash).collect();
        let tree = MerkleTree::new(leaves).map_err(|e| ProofApiError::Request(e.into()))?;
        let proof = tree.get_proof_by_index((block_number - start) as usize);
        Ok(proof.iter().flat_map(|node| node.0).collect::<Vec<u8>>().into())
    }
}

pub fn erc20_burn_log(amount: u8) -> Log {
    Log {
        address: TOKEN,
        topics: vec![
            EventSignature::ERC20_TRANSFER,
            B256::left_padding_from(&[0xaa]),
            B256::ZERO,
        ],
        data: Bytes::from(vec![amount; 32]),
    }
}

pub fn erc1155_batch_burn_log(batch: u8) -> Log {
    Log {
        address: TOKEN,
        topics: vec![
            EventSignature::ERC1155_BATCH_TRANSFER,
            B256::left_padding_from(&[0xaa]),
            B256::left_padding_from(&[0xaa]),
            B256::ZERO,
        ],
        data: Bytes::from(vec![batch; 64]),
    }
}

pub fn local_builder(chain: &Arc<FakeChain>) -> ExitPayloadBuilder {
    ExitPayloadBuilder::new(chain.clone(), chain.clone()).with_receipt_concurrency(3)
}
