//! Pending work: the shared, ordered pool of block hashes not yet reserved.

use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::chain::BlockHash;

/// Thread-safe ordered supplier of `(hash, height)` pairs.
///
/// Each call is atomic on its own, but nothing ties a `size()` check to a
/// later `pop()`: the pool can shrink in between, so `pop()` returns `None`
/// rather than assuming an item is there.
pub trait PendingWork: Send + Sync {
    /// Items remaining.
    fn size(&self) -> usize;

    /// Remove and return the next item, or `None` if the pool is empty.
    fn pop(&self) -> Option<(BlockHash, u64)>;
}

/// FIFO hash queue, ordered by insertion (ascending height for header sync).
#[derive(Debug, Default)]
pub struct HashQueue {
    items: Mutex<VecDeque<(BlockHash, u64)>>,
}

impl HashQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue of synthetic hashes for heights `[start, start + count)`.
    pub fn synthetic(start: u64, count: usize) -> Self {
        let items = (start..start + count as u64)
            .map(|height| (BlockHash::synthetic(height), height))
            .collect();
        Self {
            items: Mutex::new(items),
        }
    }

    /// Append one item to the back of the queue.
    pub fn push(&self, hash: BlockHash, height: u64) {
        self.items.lock().push_back((hash, height));
    }
}

impl FromIterator<(BlockHash, u64)> for HashQueue {
    fn from_iter<I: IntoIterator<Item = (BlockHash, u64)>>(iter: I) -> Self {
        Self {
            items: Mutex::new(iter.into_iter().collect()),
        }
    }
}

impl PendingWork for HashQueue {
    fn size(&self) -> usize {
        self.items.lock().len()
    }

    fn pop(&self) -> Option<(BlockHash, u64)> {
        self.items.lock().pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_queue_pops_in_height_order() {
        let q = HashQueue::synthetic(100, 3);
        assert_eq!(q.size(), 3);
        assert_eq!(q.pop(), Some((BlockHash::synthetic(100), 100)));
        assert_eq!(q.pop(), Some((BlockHash::synthetic(101), 101)));
        assert_eq!(q.pop(), Some((BlockHash::synthetic(102), 102)));
        assert_eq!(q.pop(), None);
        assert_eq!(q.size(), 0);
    }

    #[test]
    fn push_appends_to_back() {
        let q: HashQueue = [(BlockHash::synthetic(1), 1)].into_iter().collect();
        q.push(BlockHash::synthetic(2), 2);
        assert_eq!(q.pop().map(|(_, h)| h), Some(1));
        assert_eq!(q.pop().map(|(_, h)| h), Some(2));
    }
}
