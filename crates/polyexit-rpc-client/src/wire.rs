//! JSON-RPC response shapes and their conversion into engine types.

use alloy_primitives::{Address, Bloom, Bytes, B256, U64};
use polyexit_proof::{BlockWithTransactions, Log, TransactionInfo, TransactionReceipt};
use serde::Deserialize;

use crate::RpcClientError;

/// `eth_getTransactionByHash` result (fields used by the bridge only)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
}

impl From<RpcTransaction> for TransactionInfo {
    fn from(tx: RpcTransaction) -> Self {
        Self {
            hash: tx.hash,
            block_number: tx.block_number.map(|n| n.to::<u64>()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl From<RpcLog> for Log {
    fn from(log: RpcLog) -> Self {
        Self {
            address: log.address,
            topics: log.topics,
            data: log.data,
        }
    }
}

/// `eth_getTransactionReceipt` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: B256,
    pub transaction_index: U64,
    pub block_hash: B256,
    pub block_number: U64,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub root: Option<B256>,
    #[serde(default, rename = "type")]
    pub tx_type: Option<U64>,
    pub cumulative_gas_used: U64,
    pub logs_bloom: Bloom,
    pub logs: Vec<RpcLog>,
}

impl TryFrom<RpcReceipt> for TransactionReceipt {
    type Error = RpcClientError;

    fn try_from(receipt: RpcReceipt) -> Result<Self, Self::Error> {
        let tx_type = receipt
            .tx_type
            .map(|t| {
                u8::try_from(t.to::<u64>()).map_err(|_| {
                    RpcClientError::InvalidResponse(format!("transaction type {t} out of range"))
                })
            })
            .transpose()?;

        Ok(Self {
            transaction_hash: receipt.transaction_hash,
            transaction_index: receipt.transaction_index.to::<u64>(),
            block_hash: receipt.block_hash,
            block_number: receipt.block_number.to::<u64>(),
            status: receipt.status.map(|status| status != U64::ZERO),
            root: receipt.root,
            tx_type,
            cumulative_gas_used: receipt.cumulative_gas_used.to::<u64>(),
            logs_bloom: receipt.logs_bloom,
            logs: receipt.logs.into_iter().map(Log::from).collect(),
        })
    }
}

/// Entry of a block's `transactions` array, full objects or hashes depending on the request
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RpcBlockTransaction {
    Hash(B256),
    Full(RpcTransaction),
}

impl RpcBlockTransaction {
    pub fn hash(&self) -> B256 {
        match self {
            RpcBlockTransaction::Hash(hash) => *hash,
            RpcBlockTransaction::Full(tx) => tx.hash,
        }
    }
}

/// `eth_getBlockByNumber` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    pub number: U64,
    pub hash: B256,
    pub timestamp: U64,
    pub transactions_root: B256,
    pub receipts_root: B256,
    #[serde(default)]
    pub transactions: Vec<RpcBlockTransaction>,
}

impl From<RpcBlock> for BlockWithTransactions {
    fn from(block: RpcBlock) -> Self {
        Self {
            number: block.number.to::<u64>(),
            hash: block.hash,
            timestamp: block.timestamp.to::<u64>(),
            transactions_root: block.transactions_root,
            receipts_root: block.receipts_root,
            transactions: block.transactions.iter().map(RpcBlockTransaction::hash).collect(),
        }
    }
}

/// Quantity parameter, `0x`-prefixed hex without leading zeros
pub fn quantity(value: u64) -> String {
    format!("{value:#x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_receipt_conversion() {
        let receipt: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "transactionIndex": "0x2",
            "blockHash": format!("0x{}", "22".repeat(32)),
            "blockNumber": "0x1b4",
            "status": "0x1",
            "type": "0x2",
            "cumulativeGasUsed": "0x5208",
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "logs": [{
                "address": "0x0000000000000000000000000000000000001010",
                "topics": [format!("0x{}", "33".repeat(32))],
                "data": "0x01",
                "logIndex": "0x0"
            }],
            "gasUsed": "0x5208"
        }))
        .unwrap();

        let receipt = TransactionReceipt::try_from(receipt).unwrap();
        assert_eq!(receipt.transaction_index, 2);
        assert_eq!(receipt.block_number, 436);
        assert_eq!(receipt.status, Some(true));
        assert_eq!(receipt.tx_type, Some(2));
        assert_eq!(receipt.cumulative_gas_used, 21_000);
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].data.as_ref(), &[0x01]);
    }

    #[test]
    fn test_legacy_receipt_conversion() {
        let receipt: RpcReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "transactionIndex": "0x0",
            "blockHash": format!("0x{}", "22".repeat(32)),
            "blockNumber": "0x1",
            "root": format!("0x{}", "44".repeat(32)),
            "cumulativeGasUsed": "0x0",
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "logs": []
        }))
        .unwrap();

        let receipt = TransactionReceipt::try_from(receipt).unwrap();
        assert_eq!(receipt.status, None);
        assert_eq!(receipt.tx_type, None);
        assert_eq!(receipt.root, Some(B256::repeat_byte(0x44)));
    }

    #[test]
    fn test_block_with_full_or_hash_transactions() {
        let tx_hash = format!("0x{}", "55".repeat(32));
        for transactions in [
            json!([tx_hash]),
            json!([{ "hash": tx_hash, "blockNumber": "0x10", "nonce": "0x0" }]),
        ] {
            let block: RpcBlock = serde_json::from_value(json!({
                "number": "0x10",
                "hash": format!("0x{}", "66".repeat(32)),
                "timestamp": "0x64",
                "transactionsRoot": format!("0x{}", "77".repeat(32)),
                "receiptsRoot": format!("0x{}", "88".repeat(32)),
                "transactions": transactions
            }))
            .unwrap();
            let block = BlockWithTransactions::from(block);
            assert_eq!(block.number, 16);
            assert_eq!(block.timestamp, 100);
            assert_eq!(block.transactions, vec![B256::repeat_byte(0x55)]);
        }
    }

    #[test]
    fn test_quantity() {
        assert_eq!(quantity(0), "0x0");
        assert_eq!(quantity(436), "0x1b4");
    }
}
