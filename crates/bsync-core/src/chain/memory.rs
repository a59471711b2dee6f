//! In-memory chain sink used by the simulation driver and tests.

use parking_lot::Mutex;
use std::collections::BTreeMap;

use super::{Block, BlockHash, ChainSink};

/// Records imported blocks by height. A second import at an occupied height is
/// rejected, so duplicate deliveries show up as `false` returns.
#[derive(Debug, Default)]
pub struct MemoryChain {
    blocks: Mutex<BTreeMap<u64, BlockHash>>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of heights imported so far.
    pub fn len(&self) -> usize {
        self.blocks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.lock().is_empty()
    }

    /// Hash imported at `height`, if any.
    pub fn get(&self, height: u64) -> Option<BlockHash> {
        self.blocks.lock().get(&height).copied()
    }

    /// Length of the contiguous run of heights starting at `start`.
    pub fn contiguous_from(&self, start: u64) -> u64 {
        let blocks = self.blocks.lock();
        let mut next = start;
        for height in blocks.range(start..).map(|(h, _)| *h) {
            if height != next {
                break;
            }
            next += 1;
        }
        next - start
    }
}

impl ChainSink for MemoryChain {
    fn import(&self, block: Block, height: u64) -> bool {
        let mut blocks = self.blocks.lock();
        if blocks.contains_key(&height) {
            tracing::warn!("rejected duplicate block {} at height {}", block.hash, height);
            return false;
        }
        blocks.insert(height, block.hash);
        true
    }
}
