//! CLI command handlers, one file per command.

mod config;
mod plan;
mod simulate;

pub use config::run_config;
pub use plan::run_plan;
pub use simulate::{run_simulate, SimulateArgs};
