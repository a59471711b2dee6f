use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::reservation::PartitionPolicy;

/// Global configuration loaded from `~/.config/bsync/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BsyncConfig {
    /// Desired number of concurrent block download connections (one reservation row each).
    pub download_connections: usize,
    /// Rate history window per row, in seconds.
    pub rate_window_secs: u64,
    /// A row is expired when its normalized rate falls this many standard deviations below the mean.
    pub stall_deviation_multiple: f64,
    /// Expiry is only judged once at least this many rows are active.
    pub minimum_active_rows: usize,
    /// How much work moves when a row steals from the busiest row: "half" (default) or "equalize".
    #[serde(default)]
    pub partition_policy: Option<PartitionPolicy>,
}

impl Default for BsyncConfig {
    fn default() -> Self {
        Self {
            download_connections: 8,
            rate_window_secs: 10,
            stall_deviation_multiple: 1.01,
            minimum_active_rows: 3,
            partition_policy: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bsync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BsyncConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BsyncConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<BsyncConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: BsyncConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
