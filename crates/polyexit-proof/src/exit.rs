//! Exit payload construction for burn transactions.

use std::sync::Arc;

use alloy_primitives::{Bytes, B256};
use tracing::{debug, info, warn};

use crate::chain::{ChildChainReader, ProofApi, RootChainReader};
use crate::checkpoint::CheckpointLocator;
use crate::error::{ExitProofError, ProofApiError};
use crate::event_log::EventLogLocator;
use crate::fast_proof::FastMerkleProofBuilder;
use crate::merkle::tree_depth;
use crate::payload::{
    encode_exit_path, encode_parent_nodes, exit_hash, ExitPayload, ExitPayloadFields,
};
use crate::receipt::{encode_receipt, ReceiptTrieProof, ReceiptTrieProofBuilder};
use crate::types::{BlockWithTransactions, ChainBlockInfo, CheckpointRange, TransactionReceipt};

/// Receipts fetched in parallel when rebuilding a receipts trie
pub const DEFAULT_RECEIPT_CONCURRENCY: usize = 16;

/// Where checkpoint ranges and block proofs come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofStrategy {
    /// Ask the proof API first, compute locally if it fails for any reason other than
    /// not being configured
    RemoteAssisted,
    /// Root chain binary search and `eth_getRootHash` queries only
    LocalComputed,
}

/// Everything an exit payload is made of except the log index
struct ExitContext {
    checkpoint: CheckpointRange,
    block_proof: Bytes,
    block: BlockWithTransactions,
    receipt: TransactionReceipt,
    receipt_proof: ReceiptTrieProof,
}

impl ExitContext {
    fn encode_payload(&self, log_index: usize) -> ExitPayload {
        ExitPayload::encode(&ExitPayloadFields {
            header_block_number: self.checkpoint.header_block_number,
            block_proof: self.block_proof.clone(),
            block_number: self.block.number,
            timestamp: self.block.timestamp,
            transactions_root: self.block.transactions_root,
            receipts_root: self.block.receipts_root,
            receipt: encode_receipt(&self.receipt),
            receipt_parent_nodes: encode_parent_nodes(&self.receipt_proof.parent_nodes),
            path: encode_exit_path(&self.receipt_proof.path),
            log_index: log_index as u64,
        })
    }
}

/// Builds exit payloads and exit hashes for burn transactions on the child chain
pub struct ExitPayloadBuilder {
    child_chain: Arc<dyn ChildChainReader>,
    root_chain: Arc<dyn RootChainReader>,
    proof_api: Option<Arc<dyn ProofApi>>,
    receipt_concurrency: usize,
}

impl ExitPayloadBuilder {
    pub fn new(
        child_chain: Arc<dyn ChildChainReader>,
        root_chain: Arc<dyn RootChainReader>,
    ) -> Self {
        Self {
            child_chain,
            root_chain,
            proof_api: None,
            receipt_concurrency: DEFAULT_RECEIPT_CONCURRENCY,
        }
    }

    pub fn with_proof_api(mut self, proof_api: Arc<dyn ProofApi>) -> Self {
        self.proof_api = Some(proof_api);
        self
    }

    pub fn with_receipt_concurrency(mut self, receipt_concurrency: usize) -> Self {
        self.receipt_concurrency = receipt_concurrency.max(1);
        self
    }

    pub fn has_proof_api(&self) -> bool {
        self.proof_api.is_some()
    }

    /// Block of the burn transaction and the last checkpointed child block
    pub async fn get_chain_block_info(
        &self,
        burn_tx_hash: B256,
    ) -> Result<ChainBlockInfo, ExitProofError> {
        let tx = self.child_chain.get_transaction(burn_tx_hash).await?;
        let tx_block_number = tx
            .block_number
            .ok_or(ExitProofError::TransactionPending(burn_tx_hash))?;
        let last_child_block = self.root_chain.get_last_child_block().await?;
        Ok(ChainBlockInfo {
            last_child_block,
            tx_block_number,
        })
    }

    pub async fn is_checkpointed(&self, burn_tx_hash: B256) -> Result<bool, ExitProofError> {
        Ok(self
            .get_chain_block_info(burn_tx_hash)
            .await?
            .is_checkpointed())
    }

    /// Exit payload for the burn log selected by `index` among the logs matching
    /// `event_signature`
    pub async fn build_payload_for_exit(
        &self,
        burn_tx_hash: B256,
        index: usize,
        event_signature: B256,
        use_proof_api: bool,
    ) -> Result<ExitPayload, ExitProofError> {
        let strategy = self.strategy(use_proof_api)?;
        let context = self.prepare_exit(burn_tx_hash, strategy).await?;
        let log_index =
            EventLogLocator::new(event_signature).select(&context.receipt.logs, index)?;

        info!(
            "Built exit payload for {} (block {}, checkpoint {}, log {})",
            burn_tx_hash, context.block.number, context.checkpoint.header_block_number, log_index
        );
        Ok(context.encode_payload(log_index))
    }

    /// One exit payload per log matching `event_signature`, for batch burns
    pub async fn build_multiple_payloads_for_exit(
        &self,
        burn_tx_hash: B256,
        event_signature: B256,
        use_proof_api: bool,
    ) -> Result<Vec<ExitPayload>, ExitProofError> {
        let strategy = self.strategy(use_proof_api)?;
        let context = self.prepare_exit(burn_tx_hash, strategy).await?;
        let log_indices =
            EventLogLocator::new(event_signature).all_matching_indices(&context.receipt.logs)?;

        info!(
            "Built {} exit payloads for {} (block {})",
            log_indices.len(),
            burn_tx_hash,
            context.block.number
        );
        Ok(log_indices
            .into_iter()
            .map(|log_index| context.encode_payload(log_index))
            .collect())
    }

    /// Key of the exit in `RootChainManager.processedExits`
    pub async fn get_exit_hash(
        &self,
        burn_tx_hash: B256,
        index: usize,
        event_signature: B256,
    ) -> Result<B256, ExitProofError> {
        let last_child_block = self.root_chain.get_last_child_block().await?;
        let receipt = self.child_chain.get_transaction_receipt(burn_tx_hash).await?;
        let block_info = ChainBlockInfo {
            last_child_block,
            tx_block_number: receipt.block_number,
        };
        ensure_checkpointed(&block_info)?;

        let block = self
            .child_chain
            .get_block_with_transactions(receipt.block_number)
            .await?;
        let receipt_proof = self.receipt_proof(&receipt, &block).await?;
        let log_index = EventLogLocator::new(event_signature).select(&receipt.logs, index)?;

        Ok(exit_hash(
            receipt.block_number,
            &receipt_proof.path,
            log_index as u64,
        ))
    }

    /// Whether the root chain has already processed this exit
    pub async fn is_exit_processed(
        &self,
        burn_tx_hash: B256,
        index: usize,
        event_signature: B256,
    ) -> Result<bool, ExitProofError> {
        let exit_hash = self
            .get_exit_hash(burn_tx_hash, index, event_signature)
            .await?;
        debug!("Exit hash of {} is {}", burn_tx_hash, exit_hash);
        Ok(self.root_chain.is_exit_processed(exit_hash).await?)
    }

    /// Proof API availability is checked before any chain call
    fn strategy(&self, use_proof_api: bool) -> Result<ProofStrategy, ExitProofError> {
        match (use_proof_api, self.proof_api.is_some()) {
            (true, true) => Ok(ProofStrategy::RemoteAssisted),
            (true, false) => Err(ExitProofError::ProofServiceNotConfigured),
            (false, _) => Ok(ProofStrategy::LocalComputed),
        }
    }

    fn proof_api(&self) -> Result<&dyn ProofApi, ExitProofError> {
        self.proof_api
            .as_deref()
            .ok_or(ExitProofError::ProofServiceNotConfigured)
    }

    async fn prepare_exit(
        &self,
        burn_tx_hash: B256,
        strategy: ProofStrategy,
    ) -> Result<ExitContext, ExitProofError> {
        let block_info = self.get_chain_block_info(burn_tx_hash).await?;
        ensure_checkpointed(&block_info)?;

        let receipt = self.child_chain.get_transaction_receipt(burn_tx_hash).await?;
        let block = self
            .child_chain
            .get_block_with_transactions(receipt.block_number)
            .await?;

        let checkpoint = self.resolve_checkpoint(strategy, block.number).await?;
        let block_proof = self
            .resolve_block_proof(strategy, &checkpoint, block.number)
            .await?;
        let receipt_proof = self.receipt_proof(&receipt, &block).await?;

        Ok(ExitContext {
            checkpoint,
            block_proof,
            block,
            receipt,
            receipt_proof,
        })
    }

    async fn resolve_checkpoint(
        &self,
        strategy: ProofStrategy,
        block_number: u64,
    ) -> Result<CheckpointRange, ExitProofError> {
        if strategy == ProofStrategy::RemoteAssisted {
            match self.proof_api()?.get_block_included(block_number).await {
                Ok(range) if range.contains(block_number) => {
                    debug!(
                        "Proof API places block {} in checkpoint {}",
                        block_number, range.header_block_number
                    );
                    return Ok(range);
                }
                Ok(range) => warn!(
                    "Proof API checkpoint [{}, {}] does not contain block {}, falling back to root chain",
                    range.start, range.end, block_number
                ),
                Err(ProofApiError::NotConfigured) => {
                    return Err(ExitProofError::ProofServiceNotConfigured)
                }
                Err(err) => warn!(
                    "Proof API checkpoint lookup for block {} failed, falling back to root chain: {}",
                    block_number, err
                ),
            }
        }

        CheckpointLocator::new(self.root_chain.as_ref())
            .find_checkpoint_for_block(block_number)
            .await
    }

    async fn resolve_block_proof(
        &self,
        strategy: ProofStrategy,
        checkpoint: &CheckpointRange,
        block_number: u64,
    ) -> Result<Bytes, ExitProofError> {
        if strategy == ProofStrategy::RemoteAssisted {
            let proof = self
                .proof_api()?
                .get_fast_merkle_proof(checkpoint.start, checkpoint.end, block_number)
                .await;
            let expected_len = 32 * tree_depth(checkpoint.len() as usize);
            match proof {
                Ok(proof) if proof.len() == expected_len => return Ok(proof),
                Ok(proof) => warn!(
                    "Proof API returned a {} byte block proof for block {}, expected {}, \
                     computing it locally",
                    proof.len(),
                    block_number,
                    expected_len
                ),
                Err(ProofApiError::NotConfigured) => {
                    return Err(ExitProofError::ProofServiceNotConfigured)
                }
                Err(err) => warn!(
                    "Proof API block proof for block {} failed, computing it locally: {}",
                    block_number, err
                ),
            }
        }

        FastMerkleProofBuilder::new(self.child_chain.as_ref())
            .build_block_proof(block_number, checkpoint.start, checkpoint.end)
            .await
    }

    async fn receipt_proof(
        &self,
        receipt: &TransactionReceipt,
        block: &BlockWithTransactions,
    ) -> Result<ReceiptTrieProof, ExitProofError> {
        ReceiptTrieProofBuilder::new(self.child_chain.as_ref(), self.receipt_concurrency)
            .get_receipt_proof(receipt, block)
            .await
    }
}

fn ensure_checkpointed(block_info: &ChainBlockInfo) -> Result<(), ExitProofError> {
    if block_info.is_checkpointed() {
        Ok(())
    } else {
        Err(ExitProofError::NotCheckpointed {
            tx_block_number: block_info.tx_block_number,
            last_child_block: block_info.last_child_block,
        })
    }
}
