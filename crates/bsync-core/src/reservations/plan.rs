//! Initial table sizing: how many rows, and how many blocks each starts with.

use serde::Serialize;

/// Protocol maximum number of blocks in one get-data request; also the
/// per-row reservation cap.
pub const MAX_BLOCK_REQUEST: usize = 50_000;

/// Upper bound on rows so `rows * MAX_BLOCK_REQUEST` cannot overflow.
pub const MAX_ROWS: usize = usize::MAX / MAX_BLOCK_REQUEST;

/// Result of sizing the table against the pending pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllocationPlan {
    /// Pending items when the plan was made.
    pub pending: usize,
    /// Rows to create (slots `0..rows`).
    pub rows: usize,
    /// Items the rows may hold in total: `min(pending, rows * MAX_BLOCK_REQUEST)`.
    pub allocation: usize,
}

impl AllocationPlan {
    /// Round-robin rounds; each round gives every row one item.
    pub fn per_row(&self) -> usize {
        if self.rows == 0 {
            0
        } else {
            self.allocation / self.rows
        }
    }

    /// Items handed out at initialization. Never exceeds `allocation`.
    pub fn distributed(&self) -> usize {
        self.per_row() * self.rows
    }

    /// Items left in the pending pool for on-demand reservation.
    pub fn retained(&self) -> usize {
        self.pending - self.distributed()
    }
}

/// Size the table for `desired_rows` rows over `pending` items.
///
/// Rows are capped at [`MAX_ROWS`] and at `pending` so every row starts with
/// at least one block; zero pending items yields zero rows.
pub fn plan_allocation(desired_rows: usize, pending: usize) -> AllocationPlan {
    let rows = desired_rows.min(MAX_ROWS).min(pending);
    let allocation = pending.min(rows * MAX_BLOCK_REQUEST);
    AllocationPlan {
        pending,
        rows,
        allocation,
    }
}
