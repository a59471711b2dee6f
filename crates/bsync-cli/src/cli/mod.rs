//! CLI for the bsync block reservation scheduler.

mod commands;

use anyhow::Result;
use bsync_core::config::{self, BsyncConfig};
use bsync_core::reservation::PartitionPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_config, run_plan, run_simulate, SimulateArgs};

/// Top-level CLI for bsync.
#[derive(Debug, Parser)]
#[command(name = "bsync")]
#[command(about = "bsync: block download reservations across peer connections", long_about = None)]
pub struct Cli {
    /// Read settings from this file instead of ~/.config/bsync/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show how pending blocks would be split across reservation rows.
    Plan {
        /// Number of pending blocks.
        #[arg(long)]
        blocks: usize,
        /// Desired rows (defaults to download_connections from config).
        #[arg(long, value_name = "N")]
        connections: Option<usize>,
    },

    /// Run a simulated sync with fast and slow peers against the reservation table.
    Simulate {
        /// Number of blocks to synchronize.
        #[arg(long, default_value = "10000")]
        blocks: usize,
        /// Desired rows (defaults to download_connections from config).
        #[arg(long, value_name = "N")]
        connections: Option<usize>,
        /// Total peers, including spares (defaults to rows + 2).
        #[arg(long)]
        peers: Option<usize>,
        /// Number of slow peers, attached first.
        #[arg(long, default_value = "1")]
        slow: usize,
        /// Per-block latency of a normal peer, in microseconds.
        #[arg(long, default_value = "200", value_name = "US")]
        latency_us: u64,
        /// Per-block latency of a slow peer, in milliseconds.
        #[arg(long, default_value = "5", value_name = "MS")]
        slow_latency_ms: u64,
        /// Partition policy override: "half" or "equalize".
        #[arg(long, value_parser = parse_policy)]
        policy: Option<PartitionPolicy>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the config file path and effective settings.
    Config,
}

fn parse_policy(s: &str) -> Result<PartitionPolicy, String> {
    match s.to_ascii_lowercase().as_str() {
        "half" => Ok(PartitionPolicy::Half),
        "equalize" => Ok(PartitionPolicy::Equalize),
        other => Err(format!("unknown partition policy '{other}' (expected half or equalize)")),
    }
}

impl Cli {
    fn load_config(&self) -> Result<BsyncConfig> {
        match &self.config {
            Some(path) => config::load_from_path(path),
            None => config::load_or_init(),
        }
    }

    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = cli.load_config()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Plan { blocks, connections } => {
                run_plan(blocks, connections.unwrap_or(cfg.download_connections));
            }
            CliCommand::Simulate {
                blocks,
                connections,
                peers,
                slow,
                latency_us,
                slow_latency_ms,
                policy,
                json,
            } => {
                if let Some(n) = connections {
                    cfg.download_connections = n;
                }
                if policy.is_some() {
                    cfg.partition_policy = policy;
                }
                let args = SimulateArgs {
                    blocks,
                    peers,
                    slow,
                    latency_us,
                    slow_latency_ms,
                    json,
                };
                run_simulate(&cfg, args).await?;
            }
            CliCommand::Config => run_config(cli.config.as_deref(), &cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
