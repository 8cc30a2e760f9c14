use alloy_primitives::B256;
use async_trait::async_trait;
use jsonrpsee::rpc_params;
use polyexit_proof::{BlockWithTransactions, ChildChainReader, TransactionInfo, TransactionReceipt};

use crate::wire::{quantity, RpcBlock, RpcReceipt, RpcTransaction};
use crate::{EthRpcClient, RpcClientError};

/// Child chain (Bor) node client
#[derive(Debug)]
pub struct ChildChainClient {
    rpc: EthRpcClient,
}

impl ChildChainClient {
    pub fn new(rpc: EthRpcClient) -> Self {
        Self { rpc }
    }

    /// Get transaction by hash
    pub async fn transaction(&self, hash: B256) -> Result<TransactionInfo, RpcClientError> {
        let tx: RpcTransaction = self
            .rpc
            .request_object("eth_getTransactionByHash", rpc_params![hash], "transaction", hash)
            .await?;
        Ok(tx.into())
    }

    /// Get transaction receipt by transaction hash
    pub async fn receipt(&self, hash: B256) -> Result<TransactionReceipt, RpcClientError> {
        let receipt: RpcReceipt = self
            .rpc
            .request_object("eth_getTransactionReceipt", rpc_params![hash], "receipt", hash)
            .await?;
        receipt.try_into()
    }

    /// Get block by number, with its transactions
    pub async fn block(&self, number: u64) -> Result<BlockWithTransactions, RpcClientError> {
        let block: RpcBlock = self
            .rpc
            .request_object(
                "eth_getBlockByNumber",
                rpc_params![quantity(number), true],
                "block",
                number,
            )
            .await?;
        Ok(block.into())
    }

    /// Get the Merkle root of the block range `[start, end]` (Bor `eth_getRootHash`)
    pub async fn root_hash(&self, start: u64, end: u64) -> Result<B256, RpcClientError> {
        let root: String = self
            .rpc
            .request("eth_getRootHash", rpc_params![start, end])
            .await?;
        parse_root_hash(&root)
    }
}

/// Bor answers with bare hex, optionally `0x`-prefixed
fn parse_root_hash(root: &str) -> Result<B256, RpcClientError> {
    let bytes = hex::decode(root.strip_prefix("0x").unwrap_or(root))?;
    if bytes.len() != B256::len_bytes() {
        return Err(RpcClientError::InvalidResponse(format!(
            "root hash has {} bytes",
            bytes.len()
        )));
    }
    Ok(B256::from_slice(&bytes))
}

#[async_trait]
impl ChildChainReader for ChildChainClient {
    async fn get_transaction(&self, hash: B256) -> anyhow::Result<TransactionInfo> {
        Ok(self.transaction(hash).await?)
    }

    async fn get_transaction_receipt(&self, hash: B256) -> anyhow::Result<TransactionReceipt> {
        Ok(self.receipt(hash).await?)
    }

    async fn get_block_with_transactions(
        &self,
        block_number: u64,
    ) -> anyhow::Result<BlockWithTransactions> {
        Ok(self.block(block_number).await?)
    }

    async fn get_root_hash(&self, start_block: u64, end_block: u64) -> anyhow::Result<B256> {
        Ok(self.root_hash(start_block, end_block).await?)
    }
}
