//! Root chain contract bindings.

use alloy_sol_types::sol;

sol! {
    /// Checkpoint registry on the root chain (`RootChainProxy`)
    interface IRootChain {
        /// Checkpoint stored under `headerBlockId` (a multiple of the checkpoint interval)
        function headerBlocks(uint256 headerBlockId) external view returns (bytes32 root, uint256 start, uint256 end, uint256 createdAt, address proposer);

        /// Last child block covered by a checkpoint
        function getLastChildBlock() external view returns (uint256);

        /// Key of the next checkpoint to be submitted
        function currentHeaderBlock() external view returns (uint256);
    }

    /// PoS bridge entry point on the root chain (`RootChainManagerProxy`)
    interface IRootChainManager {
        /// Whether the exit with the given hash has been processed
        function processedExits(bytes32 exitHash) external view returns (bool);

        /// Release bridged funds using an exit payload
        function exit(bytes calldata inputData) external;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{hex, Bytes, U256};
    use alloy_sol_types::SolCall;

    #[test]
    fn test_exit_selector() {
        assert_eq!(IRootChainManager::exitCall::SELECTOR, hex!("3805550f"));
    }

    #[test]
    fn test_exit_calldata() {
        let call = IRootChainManager::exitCall {
            inputData: Bytes::from(vec![0xab; 3]),
        };
        let encoded = call.abi_encode();
        assert_eq!(&encoded[..4], IRootChainManager::exitCall::SELECTOR.as_slice());
        // offset, length, one padded word
        assert_eq!(encoded.len(), 4 + 32 * 3);
        assert_eq!(U256::from_be_slice(&encoded[36..68]), U256::from(3));
    }
}
