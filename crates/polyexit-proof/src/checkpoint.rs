//! Checkpoint lookup on the root chain.

use tracing::debug;

use crate::chain::RootChainReader;
use crate::error::ExitProofError;
use crate::types::CheckpointRange;

/// Spacing of checkpoint keys in `RootChain.headerBlocks`
pub const CHECKPOINT_INTERVAL: u64 = 10_000;

/// Binary search over the committed checkpoints for the one containing a child block
pub struct CheckpointLocator<'a> {
    root_chain: &'a dyn RootChainReader,
}

impl<'a> CheckpointLocator<'a> {
    pub fn new(root_chain: &'a dyn RootChainReader) -> Self {
        Self { root_chain }
    }

    /// Find the checkpoint whose `[start, end]` contains `child_block_number`.
    ///
    /// Checkpoint indices `1..=currentHeaderBlock / 10000` are searched, relying on their
    /// ranges being contiguous and ordered.
    pub async fn find_checkpoint_for_block(
        &self,
        child_block_number: u64,
    ) -> Result<CheckpointRange, ExitProofError> {
        let current_header_block = self.root_chain.current_header_block().await?;

        let mut low = 1;
        let mut high = current_header_block / CHECKPOINT_INTERVAL;
        while low <= high {
            let mid = low + (high - low) / 2;
            let range = self.checkpoint_range(mid).await?;
            debug!(
                "Checkpoint {} covers [{}, {}]",
                range.header_block_number, range.start, range.end
            );

            if range.contains(child_block_number) {
                return Ok(range);
            }
            if range.start > child_block_number {
                high = mid - 1;
            } else {
                low = mid + 1;
            }
        }

        Err(ExitProofError::CheckpointNotFound {
            block_number: child_block_number,
        })
    }

    /// Range of the checkpoint with the given index (not key)
    pub async fn checkpoint_range(&self, index: u64) -> Result<CheckpointRange, ExitProofError> {
        let header_block_number = index * CHECKPOINT_INTERVAL;
        let header = self.root_chain.header_block(header_block_number).await?;
        Ok(CheckpointRange {
            header_block_number,
            start: header.start,
            end: header.end,
        })
    }
}
