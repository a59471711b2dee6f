//! Simulation parameter and runtime errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("no blocks to synchronize")]
    NoBlocks,
    #[error("download_connections must be at least 1")]
    NoConnections,
    #[error("{peers} peers cannot serve {rows} reservation rows")]
    NotEnoughPeers { peers: usize, rows: usize },
    #[error("{slow} slow peers requested but only {peers} peers exist")]
    TooManySlowPeers { slow: usize, peers: usize },
    #[error("session for slot ({slot}) panicked")]
    SessionPanicked { slot: usize },
}
