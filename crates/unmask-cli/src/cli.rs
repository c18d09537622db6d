//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Unmask - See who you are really paying
#[derive(Parser)]
#[command(name = "unmask")]
#[command(about = "Unmask payment-processor merchants and profile your vendors", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Analysis config file (defaults to the data-dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a transaction file
    Analyze {
        /// CSV or JSON file with date, description and amount fields
        #[arg(short, long)]
        file: PathBuf,

        /// Input format: csv, json (detected from the extension if not specified)
        #[arg(long)]
        format: Option<String>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Unmask a single description
    Explain {
        /// Raw description, e.g. "PAYPAL *GRUBHUB"
        description: String,

        /// Charge amount, enables amount-based suggestions
        #[arg(short, long)]
        amount: Option<f64>,

        /// Extended details or memo text to search for the vendor
        #[arg(long)]
        details: Option<String>,
    },

    /// List the payment processors that are recognized
    Processors,
}
