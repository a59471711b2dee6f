//! One peer session working one reservation row until no work remains.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use crate::chain::BlockHash;
use crate::reservation::Reservation;
use crate::reservations::{PopulateOutcome, Reservations};

use super::peer::{PeerPool, SimPeer};

#[derive(Debug, Default, Clone, Copy)]
pub(super) struct SessionStats {
    pub(super) imported: usize,
    pub(super) rejected: usize,
    pub(super) unrequested: usize,
    pub(super) replaced: usize,
}

/// Request, receive and import blocks for `row`. When the row runs dry it is
/// populated; when populate finds nothing the row is removed and the session
/// ends. A peer whose rate falls out of line is swapped for a spare one.
pub(super) fn run_session(
    row: Arc<Reservation>,
    reservations: &Reservations,
    pool: &PeerPool,
    mut peer: SimPeer,
) -> SessionStats {
    let mut stats = SessionStats::default();
    let mut outstanding: VecDeque<(BlockHash, u64)> = VecDeque::new();
    let mut new_channel = true;

    loop {
        let requested = row.request(new_channel);
        new_channel = false;
        if !requested.is_empty() {
            outstanding = requested.into();
        }

        let Some((hash, height)) = outstanding.pop_front() else {
            if !row.is_empty() {
                // Everything requested was answered but work remains; ask again.
                new_channel = true;
                continue;
            }
            if reservations.populate(&row) == PopulateOutcome::Exhausted {
                break;
            }
            continue;
        };

        let started = Instant::now();
        let block = peer.deliver(hash, height);
        let Some(reserved_height) = row.take(&block.hash) else {
            // Moved to another row by a partition after we requested it.
            stats.unrequested += 1;
            continue;
        };

        let importing = Instant::now();
        if reservations.import(block, reserved_height) {
            stats.imported += 1;
        } else {
            stats.rejected += 1;
        }
        row.update_rate(1, started.elapsed(), importing.elapsed());

        if reservations.expired(&row) {
            if let Some(next) = pool.checkout() {
                tracing::info!(
                    "slot ({}) peer {} expired at {:.1} blocks/s, replacing with peer {}",
                    row.slot(),
                    peer.id,
                    row.rate().normal(),
                    next.id
                );
                peer = next;
                row.reset();
                new_channel = true;
                stats.replaced += 1;
            }
        }
    }

    reservations.remove(&row);
    tracing::debug!("slot ({}) finished with peer {}", row.slot(), peer.id);
    stats
}
