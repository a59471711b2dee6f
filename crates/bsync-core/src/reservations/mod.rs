//! The reservation table: rows of pending blocks shared across peer sessions.
//!
//! Sizes the table once per session, tops rows up from the pending pool on
//! demand, steals from the busiest row when the pool runs dry, and reports
//! rate statistics used to drop stalled peers.
//!
//! Locking: the row list is behind one `parking_lot::RwLock`. Readers take
//! the shared lock; `initialize` and `remove` search under the upgradable
//! lock and upgrade only when they will mutate (parking_lot admits a single
//! upgradable holder, so two callers cannot both upgrade on stale state);
//! `populate` holds the exclusive lock across reserve and partition.

mod plan;
mod settings;
mod statistics;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::sync::Arc;

use crate::chain::{Block, ChainSink};
use crate::hash_queue::PendingWork;
use crate::reservation::Reservation;

pub use plan::{plan_allocation, AllocationPlan, MAX_BLOCK_REQUEST, MAX_ROWS};
pub use settings::ReservationSettings;
pub use statistics::RateStatistics;

/// What `populate` did for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateOutcome {
    /// The row is non-empty after topping up from the pending pool.
    Reserved { size: usize },
    /// The pool was empty; `moved` blocks were taken from slot `from`.
    Partitioned { from: usize, moved: usize },
    /// Nothing available: the pool is empty and no other row could give work.
    Exhausted,
}

/// Table of per-peer reservations for one synchronization session.
pub struct Reservations {
    hashes: Arc<dyn PendingWork>,
    chain: Arc<dyn ChainSink>,
    settings: ReservationSettings,
    table: RwLock<Vec<Arc<Reservation>>>,
}

impl Reservations {
    /// Build the table and distribute the initial allocation across
    /// `settings.download_connections` rows.
    pub fn new(
        hashes: Arc<dyn PendingWork>,
        chain: Arc<dyn ChainSink>,
        settings: ReservationSettings,
    ) -> Self {
        let reservations = Self {
            hashes,
            chain,
            settings,
            table: RwLock::new(Vec::new()),
        };
        reservations.initialize(settings.download_connections);
        reservations
    }

    pub fn settings(&self) -> &ReservationSettings {
        &self.settings
    }

    /// Forward a completed block to the chain sink. Thread safe through the
    /// sink; no table lock is taken.
    pub fn import(&self, block: Block, height: u64) -> bool {
        self.chain.import(block, height)
    }

    // Rates.
    // ------------------------------------------------------------------------

    /// Statistics over active rows. Computed on a copy of the row list; rows
    /// are read one at a time so the result may be slightly skewed against
    /// concurrent updates.
    pub fn rates(&self) -> RateStatistics {
        let rates: Vec<f64> = self
            .table()
            .iter()
            .filter(|row| !row.idle())
            .map(|row| row.rate().normal())
            .collect();
        RateStatistics::from_rates(&rates)
    }

    /// True if `row` is a below-average outlier under the configured deviation
    /// multiple.
    pub fn expired(&self, row: &Reservation) -> bool {
        row.expired(
            &self.rates(),
            self.settings.stall_deviation_multiple,
            self.settings.minimum_active_rows,
        )
    }

    // Table.
    // ------------------------------------------------------------------------

    /// Snapshot of the current rows in slot order.
    pub fn table(&self) -> Vec<Arc<Reservation>> {
        self.table.read().clone()
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Drop `row` from the table. Returns false if it was not present.
    pub fn remove(&self, row: &Arc<Reservation>) -> bool {
        let table = self.table.upgradable_read();
        let Some(index) = table.iter().position(|r| Arc::ptr_eq(r, row)) else {
            return false;
        };

        let mut table = RwLockUpgradableReadGuard::upgrade(table);
        table.remove(index);
        true
    }

    // Hashes.
    // ------------------------------------------------------------------------

    fn initialize(&self, size: usize) {
        let table = self.table.upgradable_read();
        let plan = plan_allocation(size, self.hashes.size());
        if plan.rows == 0 {
            return;
        }

        let mut table = RwLockUpgradableReadGuard::upgrade(table);
        table.reserve(plan.rows);
        for slot in 0..plan.rows {
            table.push(Arc::new(Reservation::new(
                slot,
                self.settings.partition_policy,
                self.settings.rate_window,
            )));
        }

        // (allocation / rows) * rows never exceeds allocation; the remainder
        // stays in the pending pool for later reservation.
        let mut distributed = 0usize;
        'rounds: for _ in 0..plan.per_row() {
            for row in table.iter() {
                let Some((hash, height)) = self.hashes.pop() else {
                    break 'rounds;
                };
                row.insert(hash, height);
                distributed += 1;
            }
        }
        drop(table);

        tracing::debug!(
            "reserved {} of {} blocks to {} slots",
            distributed,
            plan.pending,
            plan.rows
        );
    }

    /// Top up `row`, which is running low. Takes from the pending pool first;
    /// if that leaves the row empty, moves work from the row holding the most.
    pub fn populate(&self, row: &Arc<Reservation>) -> PopulateOutcome {
        let outcome = {
            let table = self.table.write();
            if self.reserve(row) {
                PopulateOutcome::Reserved { size: row.size() }
            } else {
                Self::partition(&table, row)
            }
        };

        match outcome {
            PopulateOutcome::Reserved { size } => {
                tracing::debug!("reserved {} blocks to slot ({})", size, row.slot());
            }
            PopulateOutcome::Partitioned { from, moved } => {
                tracing::debug!(
                    "partitioned {} blocks from slot ({}) to slot ({})",
                    moved,
                    from,
                    row.slot()
                );
            }
            PopulateOutcome::Exhausted => {
                tracing::debug!("no blocks available for slot ({})", row.slot());
            }
        }
        outcome
    }

    // Must hold the exclusive table lock. May shrink an active reservation.
    fn partition(table: &[Arc<Reservation>], minimal: &Arc<Reservation>) -> PopulateOutcome {
        let Some(maximal) = Self::find_maximal(table) else {
            return PopulateOutcome::Exhausted;
        };

        // Never select self: pointless, and it would lock the row twice.
        if Arc::ptr_eq(maximal, minimal) {
            return PopulateOutcome::Exhausted;
        }

        match maximal.partition(minimal) {
            0 => PopulateOutcome::Exhausted,
            moved => PopulateOutcome::Partitioned {
                from: maximal.slot(),
                moved,
            },
        }
    }

    /// Row with the most reserved blocks; ties go to the lowest position.
    fn find_maximal(table: &[Arc<Reservation>]) -> Option<&Arc<Reservation>> {
        let mut best: Option<(&Arc<Reservation>, usize)> = None;
        for row in table {
            let size = row.size();
            if best.map_or(true, |(_, max)| size > max) {
                best = Some((row, size));
            }
        }
        best.map(|(row, _)| row)
    }

    // Must hold the exclusive table lock.
    fn reserve(&self, minimal: &Reservation) -> bool {
        let available = self.hashes.size();
        let allocation = available.min(MAX_BLOCK_REQUEST.saturating_sub(minimal.size()));

        for _ in 0..allocation {
            let Some((hash, height)) = self.hashes.pop() else {
                break;
            };
            minimal.insert(hash, height);
        }

        // Any size is accepted here so partitioning need not compensate.
        !minimal.is_empty()
    }
}
