//! `bsync config` – show config path and effective values.

use anyhow::Result;
use bsync_core::config::{self, BsyncConfig};
use std::path::Path;

pub fn run_config(explicit: Option<&Path>, cfg: &BsyncConfig) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
