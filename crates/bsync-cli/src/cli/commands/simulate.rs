//! `bsync simulate` – run a simulated sync and print the report.

use anyhow::{Context, Result};
use bsync_core::config::BsyncConfig;
use bsync_core::reservations::ReservationSettings;
use bsync_core::simulate::{self, SimulationParams, SimulationReport};
use std::time::Duration;

/// Simulation options taken from the command line.
#[derive(Debug, Clone, Copy)]
pub struct SimulateArgs {
    pub blocks: usize,
    pub peers: Option<usize>,
    pub slow: usize,
    pub latency_us: u64,
    pub slow_latency_ms: u64,
    pub json: bool,
}

impl SimulateArgs {
    fn params(&self, cfg: &BsyncConfig) -> SimulationParams {
        let rows = cfg.download_connections.min(self.blocks);
        SimulationParams {
            blocks: self.blocks,
            peers: self.peers.unwrap_or(rows + 2),
            slow_peers: self.slow,
            latency: Duration::from_micros(self.latency_us),
            slow_latency: Duration::from_millis(self.slow_latency_ms),
            ..SimulationParams::default()
        }
    }
}

fn print_report(report: &SimulationReport) {
    println!(
        "Rows: {}  reserved at start: {}  retained: {}",
        report.plan.rows,
        report.plan.distributed(),
        report.plan.retained()
    );
    println!(
        "Imported {} blocks in {:.2}s ({:.0} blocks/s), contiguous run {}",
        report.blocks_imported,
        report.elapsed_secs,
        report.blocks_per_sec(),
        report.contiguous_blocks
    );
    println!(
        "Rejected: {}  unrequested deliveries: {}  peers replaced: {}",
        report.blocks_rejected, report.unrequested_blocks, report.peers_replaced
    );
    match report.last_statistics {
        Some(stats) => println!(
            "Last sample: {} active rows, mean {:.1} blocks/s, deviation {:.1} ({} samples)",
            stats.active_rows,
            stats.arithmetic_mean,
            stats.standard_deviation,
            report.statistics_samples
        ),
        None => println!("No rate samples with active rows."),
    }
}

pub async fn run_simulate(cfg: &BsyncConfig, args: SimulateArgs) -> Result<()> {
    let params = args.params(cfg);
    let settings = ReservationSettings::from(cfg);
    let report = tokio::task::spawn_blocking(move || simulate::run_simulation(params, settings))
        .await
        .context("simulation task join")??;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
