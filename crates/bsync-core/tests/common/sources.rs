//! Pending-work sources and chain sinks with awkward behavior.

use std::sync::atomic::{AtomicUsize, Ordering};

use bsync_core::chain::{Block, BlockHash, ChainSink};
use bsync_core::hash_queue::{HashQueue, PendingWork};

/// Reports more items than it can actually pop, as if another consumer drained
/// the pool between a caller's `size()` and `pop()`.
pub struct OverstatedQueue {
    pub inner: HashQueue,
    pub phantom: usize,
}

impl PendingWork for OverstatedQueue {
    fn size(&self) -> usize {
        self.inner.size() + self.phantom
    }

    fn pop(&self) -> Option<(BlockHash, u64)> {
        self.inner.pop()
    }
}

/// Accepts every block and counts imports.
#[derive(Default)]
pub struct CountingChain {
    pub imported: AtomicUsize,
}

impl CountingChain {
    pub fn count(&self) -> usize {
        self.imported.load(Ordering::Relaxed)
    }
}

impl ChainSink for CountingChain {
    fn import(&self, _block: Block, _height: u64) -> bool {
        self.imported.fetch_add(1, Ordering::Relaxed);
        true
    }
}
