//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stockscan_core::AvailabilityStatus;

#[derive(Debug, Parser)]
#[command(name = "stockscan")]
#[command(author, version, about = "Store-ops product lookup and offline capture queue")]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Treat the device as offline: queue instead of calling the backend
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve scanned codes into product records (queued when offline)
    Lookup {
        /// Scanned barcodes or SKUs
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Record shelf availability for a SKU
    Capture {
        #[arg(short, long)]
        sku: String,

        #[arg(long, value_enum)]
        status: StatusArg,

        #[arg(short, long)]
        quantity: Option<f64>,

        #[arg(short, long)]
        note: Option<String>,
    },
    /// Probe the backend and reconcile the offline queue
    Sync,
    /// Show connectivity and pending capture count
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Available,
    Low,
    Unavailable,
}

impl From<StatusArg> for AvailabilityStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Available => AvailabilityStatus::Available,
            StatusArg::Low => AvailabilityStatus::Low,
            StatusArg::Unavailable => AvailabilityStatus::Unavailable,
        }
    }
}
