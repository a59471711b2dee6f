//! Height-ordered work queue owned by one row, indexed both ways.

use std::collections::{BTreeMap, HashMap};

use crate::chain::BlockHash;

#[derive(Debug, Default)]
pub(super) struct RowQueue {
    by_height: BTreeMap<u64, BlockHash>,
    by_hash: HashMap<BlockHash, u64>,
}

impl RowQueue {
    pub(super) fn len(&self) -> usize {
        self.by_height.len()
    }

    pub(super) fn insert(&mut self, hash: BlockHash, height: u64) {
        if let Some(previous) = self.by_height.insert(height, hash) {
            self.by_hash.remove(&previous);
        }
        self.by_hash.insert(hash, height);
    }

    /// Remove the entry for `hash`, returning its height.
    pub(super) fn take(&mut self, hash: &BlockHash) -> Option<u64> {
        let height = self.by_hash.remove(hash)?;
        self.by_height.remove(&height);
        Some(height)
    }

    pub(super) fn entries(&self) -> Vec<(BlockHash, u64)> {
        self.by_height.iter().map(|(h, hash)| (*hash, *h)).collect()
    }

    /// Split off the `count` highest heights.
    pub(super) fn split_top(&mut self, count: usize) -> Vec<(BlockHash, u64)> {
        let count = count.min(self.len());
        if count == 0 {
            return Vec::new();
        }
        let Some(&pivot) = self.by_height.keys().nth(self.len() - count) else {
            return Vec::new();
        };
        let top = self.by_height.split_off(&pivot);
        top.into_iter()
            .map(|(height, hash)| {
                self.by_hash.remove(&hash);
                (hash, height)
            })
            .collect()
    }
}
