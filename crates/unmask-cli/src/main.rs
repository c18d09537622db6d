//! Unmask CLI - Payment processor unmasking and vendor analysis
//!
//! Usage:
//!   unmask analyze --file CSV          Analyze a transaction file
//!   unmask explain "SQ *8472639"       Unmask one description
//!   unmask processors                  List recognized processors

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Analyze { file, format, json } => {
            commands::cmd_analyze(&file, format.as_deref(), json, cli.config.as_deref())
        }
        Commands::Explain {
            description,
            amount,
            details,
        } => commands::cmd_explain(
            &description,
            amount,
            details.as_deref(),
            cli.config.as_deref(),
        ),
        Commands::Processors => commands::cmd_processors(),
    }
}
