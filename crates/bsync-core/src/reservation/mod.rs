//! One row of the reservation table: a peer's slice of pending blocks plus
//! the rate tracking used to spot slow peers.
//!
//! Rows are shared (`Arc`) between the table and the peer session that works
//! them. Queue and rate state sit behind separate locks so statistics readers
//! never wait on queue mutation.

mod partition;
mod queue;
mod rate;

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::chain::BlockHash;
use crate::reservations::RateStatistics;

use queue::RowQueue;
use rate::RateHistory;

pub use partition::PartitionPolicy;
pub use rate::{divide, Rate};

/// A peer's reservation of block hashes.
#[derive(Debug)]
pub struct Reservation {
    slot: usize,
    policy: PartitionPolicy,
    queue: Mutex<RowQueue>,
    history: Mutex<RateHistory>,
    rate: RwLock<Rate>,
    /// Set when the queue changed under the peer (insert, partition, reset)
    /// so the next `request` hands out the whole queue again.
    pending: AtomicBool,
}

impl Reservation {
    pub fn new(slot: usize, policy: PartitionPolicy, rate_window: Duration) -> Self {
        Self {
            slot,
            policy,
            queue: Mutex::new(RowQueue::default()),
            history: Mutex::new(RateHistory::new(rate_window)),
            rate: RwLock::new(Rate::default()),
            pending: AtomicBool::new(true),
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn size(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// True while no peer has reported throughput since creation or reset.
    pub fn idle(&self) -> bool {
        self.rate.read().idle
    }

    /// Cached rate as of the last `update_rate`.
    pub fn rate(&self) -> Rate {
        *self.rate.read()
    }

    pub fn insert(&self, hash: BlockHash, height: u64) {
        self.queue.lock().insert(hash, height);
        self.pending.store(true, Ordering::Release);
    }

    /// Remove a delivered block from the queue, returning the height it was
    /// reserved at. `None` means the block was never reserved here or has
    /// since been moved to another row.
    pub fn take(&self, hash: &BlockHash) -> Option<u64> {
        let height = self.queue.lock().take(hash);
        if height.is_none() {
            tracing::debug!("ignoring unrequested block {} on slot ({})", hash, self.slot);
        }
        height
    }

    /// Hashes the peer must request. A new channel always gets the whole
    /// queue; otherwise the queue is handed out again only if it changed since
    /// the last request (new work, or a partition made the old request stale).
    pub fn request(&self, new_channel: bool) -> Vec<(BlockHash, u64)> {
        let changed = self.pending.swap(false, Ordering::AcqRel);
        if !new_channel && !changed {
            return Vec::new();
        }
        self.queue.lock().entries()
    }

    /// Record `events` blocks received over `elapsed`, of which `discount` was
    /// spent importing.
    pub fn update_rate(&self, events: usize, elapsed: Duration, discount: Duration) -> Rate {
        self.update_rate_at(events, elapsed, discount, Instant::now())
    }

    /// As `update_rate`, with an explicit sample time.
    pub fn update_rate_at(
        &self,
        events: usize,
        elapsed: Duration,
        discount: Duration,
        now: Instant,
    ) -> Rate {
        let rate = self.history.lock().record(events, elapsed, discount, now);
        *self.rate.write() = rate;
        rate
    }

    /// Forget rate history and mark the row idle; the next owner re-requests
    /// the whole queue.
    pub fn reset(&self) {
        self.history.lock().clear();
        *self.rate.write() = Rate::default();
        self.pending.store(true, Ordering::Release);
    }

    /// True if this row's normalized rate is a below-average outlier: more than
    /// `multiple` standard deviations under the mean of `statistics`.
    /// Never true for an idle row or with fewer than `minimum_rows` active rows.
    pub fn expired(&self, statistics: &RateStatistics, multiple: f64, minimum_rows: usize) -> bool {
        let rate = self.rate();
        if rate.idle || statistics.active_rows < minimum_rows.max(1) {
            return false;
        }
        let deviation = rate.normal() - statistics.arithmetic_mean;
        let allowed = multiple * statistics.standard_deviation;
        deviation < 0.0 && deviation.abs() > allowed
    }

    /// Move part of this row's queue (its highest heights) into `minimal`.
    /// Returns the number of items moved; partitioning a row into itself is a
    /// no-op.
    ///
    /// Locks this row's queue before `minimal`'s. Callers must only partition
    /// while holding the table's exclusive lock so no other path holds two row
    /// locks at once.
    pub fn partition(&self, minimal: &Reservation) -> usize {
        if std::ptr::eq(self, minimal) {
            return 0;
        }

        let (moved, remaining) = {
            let mut donor = self.queue.lock();
            let mut recipient = minimal.queue.lock();
            let count = self.policy.split_count(donor.len(), recipient.len());
            let moved = donor.split_top(count);
            for (hash, height) in &moved {
                recipient.insert(*hash, *height);
            }
            (moved.len(), donor.len())
        };

        if moved > 0 {
            self.pending.store(true, Ordering::Release);
            minimal.pending.store(true, Ordering::Release);
        }

        tracing::debug!(
            "moved {} blocks from slot ({}) to slot ({}) leaving {}",
            moved,
            self.slot,
            minimal.slot,
            remaining
        );
        moved
    }
}
