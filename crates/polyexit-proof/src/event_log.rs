//! Burn event selection within a receipt.

use alloy_primitives::{b256, B256};

use crate::error::ExitProofError;
use crate::types::Log;

/// Topic-0 hashes of the burn events understood by the root chain predicates
pub struct EventSignature;

impl EventSignature {
    /// `Transfer(address,address,uint256)`
    pub const ERC20_TRANSFER: B256 =
        b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");
    /// `Transfer(address,address,uint256)` with an indexed token id
    pub const ERC721_TRANSFER: B256 =
        b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");
    /// `TransferSingle(address,address,address,uint256,uint256)`
    pub const ERC1155_TRANSFER: B256 =
        b256!("c3d58168c5ae7397731d063d5bbf3d657854427343f4c083240f7aacaa2d0f62");
    /// `WithdrawnBatch(address,uint256[])`
    pub const ERC721_BATCH_TRANSFER: B256 =
        b256!("f871896b17e9cb7a64941c62c188a4f5c621b86800e3d15452ece01ce56073df");
    /// `TransferBatch(address,address,address,uint256[],uint256[])`
    pub const ERC1155_BATCH_TRANSFER: B256 =
        b256!("4a39dc06d4c0dbc64b70af90fd698a233a518aa5d07e595d983b8c0526c8f7fb");
    /// `TransferWithMetadata(address,address,uint256,bytes)`
    pub const ERC721_TRANSFER_WITH_METADATA: B256 =
        b256!("f94915c6d1fd521cee85359239227480c7e8776d7caf1fc3bacad5c269b66a14");
    /// `StateSynced(uint256,address,bytes)`
    pub const STATE_SYNCED: B256 =
        b256!("103fed9db65eac19c4d870f49ab7520fe03b99f1838e5996caf47e9e43308392");
}

/// How a log is recognized as a burn for a given signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchRule {
    /// Topic 0 is the signature and the recipient topic at this position is zero
    ZeroRecipient(usize),
    /// Topic 0 is the signature
    SignatureOnly,
}

impl MatchRule {
    fn for_signature(signature: &B256) -> Self {
        if *signature == EventSignature::ERC20_TRANSFER
            || *signature == EventSignature::ERC721_TRANSFER_WITH_METADATA
        {
            MatchRule::ZeroRecipient(2)
        } else if *signature == EventSignature::ERC1155_TRANSFER
            || *signature == EventSignature::ERC1155_BATCH_TRANSFER
        {
            MatchRule::ZeroRecipient(3)
        } else {
            MatchRule::SignatureOnly
        }
    }
}

/// Picks burn logs out of a receipt's logs by event signature
#[derive(Debug, Clone, Copy)]
pub struct EventLogLocator {
    signature: B256,
    rule: MatchRule,
}

impl EventLogLocator {
    pub fn new(signature: B256) -> Self {
        Self {
            signature,
            rule: MatchRule::for_signature(&signature),
        }
    }

    pub fn matches(&self, log: &Log) -> bool {
        if log.topics.first() != Some(&self.signature) {
            return false;
        }
        match self.rule {
            MatchRule::ZeroRecipient(position) => log.topics.get(position) == Some(&B256::ZERO),
            MatchRule::SignatureOnly => true,
        }
    }

    /// Position in `logs` of the first matching log
    pub fn first_matching_index(&self, logs: &[Log]) -> Result<usize, ExitProofError> {
        logs.iter()
            .position(|log| self.matches(log))
            .ok_or(ExitProofError::LogNotFound {
                signature: self.signature,
                index: None,
            })
    }

    /// Positions in `logs` of every matching log, in receipt order
    pub fn all_matching_indices(&self, logs: &[Log]) -> Result<Vec<usize>, ExitProofError> {
        let indices: Vec<usize> = logs
            .iter()
            .enumerate()
            .filter(|(_, log)| self.matches(log))
            .map(|(position, _)| position)
            .collect();
        if indices.is_empty() {
            return Err(ExitProofError::LogNotFound {
                signature: self.signature,
                index: None,
            });
        }
        Ok(indices)
    }

    /// Receipt position of the log to exit with.
    ///
    /// Index 0 selects the first matching log, a positive index selects that entry of all
    /// matching logs in receipt order.
    pub fn select(&self, logs: &[Log], index: usize) -> Result<usize, ExitProofError> {
        if index == 0 {
            return self.first_matching_index(logs);
        }
        self.all_matching_indices(logs)?
            .get(index)
            .copied()
            .ok_or(ExitProofError::LogNotFound {
                signature: self.signature,
                index: Some(index),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes};

    fn log(topics: Vec<B256>) -> Log {
        Log {
            address: Address::repeat_byte(0x10),
            topics,
            data: Bytes::new(),
        }
    }

    fn topic(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    #[test]
    fn test_erc20_burn_needs_zero_recipient() {
        let locator = EventLogLocator::new(EventSignature::ERC20_TRANSFER);
        let logs = vec![
            log(vec![EventSignature::ERC20_TRANSFER, topic(1), topic(2)]),
            log(vec![EventSignature::STATE_SYNCED, topic(1), B256::ZERO]),
            log(vec![EventSignature::ERC20_TRANSFER, topic(1), B256::ZERO]),
        ];
        assert_eq!(locator.first_matching_index(&logs).unwrap(), 2);
        assert_eq!(locator.all_matching_indices(&logs).unwrap(), vec![2]);
    }

    #[test]
    fn test_erc1155_recipient_is_fourth_topic() {
        let locator = EventLogLocator::new(EventSignature::ERC1155_TRANSFER);
        let logs = vec![
            log(vec![EventSignature::ERC1155_TRANSFER, topic(9), topic(1), B256::ZERO]),
            log(vec![EventSignature::ERC1155_TRANSFER, topic(9), B256::ZERO, topic(1)]),
        ];
        assert_eq!(locator.all_matching_indices(&logs).unwrap(), vec![0]);
    }

    #[test]
    fn test_short_topic_lists_do_not_match() {
        let locator = EventLogLocator::new(EventSignature::ERC1155_BATCH_TRANSFER);
        let logs = vec![
            log(vec![]),
            log(vec![EventSignature::ERC1155_BATCH_TRANSFER, topic(1), B256::ZERO]),
        ];
        assert!(matches!(
            locator.first_matching_index(&logs),
            Err(ExitProofError::LogNotFound { index: None, .. })
        ));
    }

    #[test]
    fn test_other_signatures_match_topic_zero() {
        let locator = EventLogLocator::new(EventSignature::ERC721_BATCH_TRANSFER);
        let logs = vec![
            log(vec![EventSignature::ERC20_TRANSFER]),
            log(vec![EventSignature::ERC721_BATCH_TRANSFER]),
            log(vec![EventSignature::ERC721_BATCH_TRANSFER, topic(7)]),
        ];
        assert_eq!(locator.all_matching_indices(&logs).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_select_by_index() {
        let locator = EventLogLocator::new(EventSignature::ERC20_TRANSFER);
        let logs = vec![
            log(vec![EventSignature::ERC20_TRANSFER, topic(1), topic(2)]),
            log(vec![EventSignature::ERC20_TRANSFER, topic(1), B256::ZERO]),
            log(vec![EventSignature::STATE_SYNCED]),
            log(vec![EventSignature::ERC20_TRANSFER, topic(3), B256::ZERO]),
        ];
        assert_eq!(locator.select(&logs, 0).unwrap(), 1);
        assert_eq!(locator.select(&logs, 1).unwrap(), 3);
        assert!(matches!(
            locator.select(&logs, 2),
            Err(ExitProofError::LogNotFound { index: Some(2), .. })
        ));
    }

    #[test]
    fn test_no_logs() {
        let locator = EventLogLocator::new(EventSignature::ERC20_TRANSFER);
        assert!(locator.all_matching_indices(&[]).is_err());
        assert!(locator.select(&[], 0).is_err());
    }
}
