//! Table settings derived from the config file.

use std::time::Duration;

use crate::config::BsyncConfig;
use crate::reservation::PartitionPolicy;

/// Settings the reservation table and its rows run with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReservationSettings {
    /// Desired row count (one row per download connection).
    pub download_connections: usize,
    pub rate_window: Duration,
    pub stall_deviation_multiple: f64,
    pub minimum_active_rows: usize,
    pub partition_policy: PartitionPolicy,
}

impl Default for ReservationSettings {
    fn default() -> Self {
        Self::from(&BsyncConfig::default())
    }
}

impl From<&BsyncConfig> for ReservationSettings {
    fn from(cfg: &BsyncConfig) -> Self {
        Self {
            download_connections: cfg.download_connections,
            rate_window: Duration::from_secs(cfg.rate_window_secs.max(1)),
            stall_deviation_multiple: cfg.stall_deviation_multiple,
            minimum_active_rows: cfg.minimum_active_rows,
            partition_policy: cfg.partition_policy.unwrap_or_default(),
        }
    }
}
