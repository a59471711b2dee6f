//! Simulated block synchronization against the reservation table.
//!
//! Builds a pending pool of synthetic hashes, an in-memory chain and a
//! reservation table, then runs one OS thread per row against simulated peers
//! with fixed latencies. A monitor thread samples rate statistics while the
//! sessions run. Useful for exercising the table under real contention and
//! for comparing partition policies from the CLI.

mod error;
mod peer;
mod session;

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::chain::MemoryChain;
use crate::hash_queue::HashQueue;
use crate::reservations::{
    plan_allocation, AllocationPlan, RateStatistics, ReservationSettings, Reservations,
};

pub use error::SimulationError;

use peer::PeerPool;
use session::{run_session, SessionStats};

/// Inputs for one simulated session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationParams {
    /// Number of blocks to synchronize.
    pub blocks: usize,
    /// Height of the first block.
    pub start_height: u64,
    /// Total peers available, including spares used to replace expired ones.
    pub peers: usize,
    /// How many of the peers are slow (they are attached first).
    pub slow_peers: usize,
    /// Per-block latency of a normal peer.
    pub latency: Duration,
    /// Per-block latency of a slow peer.
    pub slow_latency: Duration,
    /// How often the monitor samples rate statistics.
    pub monitor_interval: Duration,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            blocks: 10_000,
            start_height: 1,
            peers: 10,
            slow_peers: 1,
            latency: Duration::from_micros(200),
            slow_latency: Duration::from_millis(5),
            monitor_interval: Duration::from_millis(50),
        }
    }
}

/// Outcome of a simulated session.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub plan: AllocationPlan,
    pub blocks_imported: usize,
    pub blocks_rejected: usize,
    /// Deliveries that arrived after the block had moved to another row.
    pub unrequested_blocks: usize,
    /// Length of the imported run starting at the start height.
    pub contiguous_blocks: u64,
    pub sessions_completed: usize,
    pub peers_replaced: usize,
    pub rows_remaining: usize,
    pub elapsed_secs: f64,
    pub statistics_samples: usize,
    /// Last sampled statistics with at least one active row.
    pub last_statistics: Option<RateStatistics>,
}

impl SimulationReport {
    /// Blocks imported per second over the whole run.
    pub fn blocks_per_sec(&self) -> f64 {
        crate::reservation::divide(self.blocks_imported as f64, self.elapsed_secs)
    }
}

fn validate(
    params: &SimulationParams,
    settings: &ReservationSettings,
) -> Result<AllocationPlan, SimulationError> {
    if params.blocks == 0 {
        return Err(SimulationError::NoBlocks);
    }
    if settings.download_connections == 0 {
        return Err(SimulationError::NoConnections);
    }
    if params.slow_peers > params.peers {
        return Err(SimulationError::TooManySlowPeers {
            slow: params.slow_peers,
            peers: params.peers,
        });
    }
    let plan = plan_allocation(settings.download_connections, params.blocks);
    if params.peers < plan.rows {
        return Err(SimulationError::NotEnoughPeers {
            peers: params.peers,
            rows: plan.rows,
        });
    }
    Ok(plan)
}

#[derive(Debug, Default)]
struct Monitor {
    samples: usize,
    last: Option<RateStatistics>,
}

fn monitor(reservations: &Reservations, done: &AtomicBool, interval: Duration) -> Monitor {
    let mut out = Monitor::default();
    while !done.load(Ordering::Acquire) {
        let stats = reservations.rates();
        out.samples += 1;
        if stats.active_rows > 0 {
            tracing::debug!(
                "{} active rows, mean {:.1} blocks/s, deviation {:.1}",
                stats.active_rows,
                stats.arithmetic_mean,
                stats.standard_deviation
            );
            out.last = Some(stats);
        }
        std::thread::sleep(interval);
    }
    out
}

/// Run a simulated synchronization and report what happened.
pub fn run_simulation(
    params: SimulationParams,
    settings: ReservationSettings,
) -> Result<SimulationReport, SimulationError> {
    let plan = validate(&params, &settings)?;

    let hashes = Arc::new(HashQueue::synthetic(params.start_height, params.blocks));
    let chain = Arc::new(MemoryChain::new());
    let pool = PeerPool::new(
        params.peers,
        params.slow_peers,
        params.latency,
        params.slow_latency,
    );

    let start = Instant::now();
    let reservations = Reservations::new(hashes, chain.clone(), settings);
    let rows = reservations.table();
    tracing::info!(
        "simulating {} blocks over {} rows with {} peers ({} slow)",
        params.blocks,
        rows.len(),
        params.peers,
        params.slow_peers
    );

    let done = AtomicBool::new(false);
    let (sessions, monitored) = std::thread::scope(|s| {
        let monitor_handle = s.spawn(|| monitor(&reservations, &done, params.monitor_interval));

        let mut handles = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(peer) = pool.checkout() else {
                break;
            };
            let slot = row.slot();
            let reservations = &reservations;
            let pool = &pool;
            handles.push((slot, s.spawn(move || run_session(row, reservations, pool, peer))));
        }
        tracing::debug!("{} sessions started, {} spare peers", handles.len(), pool.spare());

        let mut sessions: Vec<SessionStats> = Vec::with_capacity(handles.len());
        let mut failure = None;
        for (slot, handle) in handles {
            match handle.join() {
                Ok(stats) => sessions.push(stats),
                Err(_) => {
                    if failure.is_none() {
                        failure = Some(SimulationError::SessionPanicked { slot });
                    }
                }
            }
        }
        done.store(true, Ordering::Release);
        let monitored = monitor_handle.join().unwrap_or_default();
        match failure {
            Some(err) => Err(err),
            None => Ok((sessions, monitored)),
        }
    })?;

    let report = SimulationReport {
        plan,
        blocks_imported: sessions.iter().map(|s| s.imported).sum(),
        blocks_rejected: sessions.iter().map(|s| s.rejected).sum(),
        unrequested_blocks: sessions.iter().map(|s| s.unrequested).sum(),
        contiguous_blocks: chain.contiguous_from(params.start_height),
        sessions_completed: sessions.len(),
        peers_replaced: sessions.iter().map(|s| s.replaced).sum(),
        rows_remaining: reservations.len(),
        elapsed_secs: start.elapsed().as_secs_f64(),
        statistics_samples: monitored.samples,
        last_statistics: monitored.last,
    };
    tracing::info!(
        "imported {} blocks in {:.2}s ({} peers replaced)",
        report.blocks_imported,
        report.elapsed_secs,
        report.peers_replaced
    );
    Ok(report)
}
