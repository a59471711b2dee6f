use bsync_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; falls back to stderr.
    logging::init_logging();

    // Parse CLI and dispatch.
    if let Err(err) = Cli::run_from_args().await {
        eprintln!("bsync error: {:#}", err);
        std::process::exit(1);
    }
}
