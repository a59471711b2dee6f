//! Simulated peers: fixed per-block latency, drawn from a shared pool.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::chain::{Block, BlockHash};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct SimPeer {
    pub(super) id: usize,
    pub(super) latency: Duration,
}

impl SimPeer {
    /// Serve one block after the peer's latency.
    pub(super) fn deliver(&self, hash: BlockHash, height: u64) -> Block {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        Block::new(hash, height.to_le_bytes().to_vec())
    }
}

/// Peers not yet attached to a row. Slow peers are queued first so they are
/// the ones handed to the initial sessions.
#[derive(Debug)]
pub(super) struct PeerPool {
    spare: Mutex<VecDeque<SimPeer>>,
}

impl PeerPool {
    pub(super) fn new(peers: usize, slow: usize, latency: Duration, slow_latency: Duration) -> Self {
        let spare = (0..peers)
            .map(|id| SimPeer {
                id,
                latency: if id < slow { slow_latency } else { latency },
            })
            .collect();
        Self {
            spare: Mutex::new(spare),
        }
    }

    pub(super) fn checkout(&self) -> Option<SimPeer> {
        self.spare.lock().pop_front()
    }

    pub(super) fn spare(&self) -> usize {
        self.spare.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_peers_checked_out_first() {
        let pool = PeerPool::new(3, 1, Duration::ZERO, Duration::from_millis(5));
        assert_eq!(pool.spare(), 3);
        let first = pool.checkout().unwrap();
        assert_eq!(first.id, 0);
        assert_eq!(first.latency, Duration::from_millis(5));
        assert_eq!(pool.checkout().unwrap().latency, Duration::ZERO);
        assert!(pool.checkout().is_some());
        assert!(pool.checkout().is_none());
    }

    #[test]
    fn deliver_returns_requested_hash() {
        let peer = SimPeer {
            id: 0,
            latency: Duration::ZERO,
        };
        let block = peer.deliver(BlockHash::synthetic(9), 9);
        assert_eq!(block.hash, BlockHash::synthetic(9));
        assert_eq!(block.payload, 9u64.to_le_bytes().to_vec());
    }
}
