//! # stockscan Entry Point
//!
//! ```bash
//! # Resolve two scanned codes for the configured store
//! stockscan lookup 9300633601234 5000112637922
//!
//! # Record a gap on the shelf (queued if offline)
//! stockscan capture --sku 123456 --status unavailable --note "gap on shelf"
//!
//! # Reconcile the offline queue
//! stockscan sync
//! ```
//!
//! The actual wiring is in lib.rs for testability.

use std::process::ExitCode;

use clap::Parser;
use stockscan_scanner::cli::Cli;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    stockscan_scanner::init_tracing();

    let cli = Cli::parse();
    match stockscan_scanner::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "stockscan failed");
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}
