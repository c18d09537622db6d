//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Load a transaction file and print the vendor report
//! - `explain` - Unmask a single description
//! - `processors` - Processor table listing

pub mod analyze;
pub mod explain;
pub mod processors;

// Re-export command functions for main.rs
pub use analyze::*;
pub use explain::*;
pub use processors::*;

use std::path::Path;

use anyhow::{Context, Result};
use unmask_core::AnalysisConfig;

/// Load analysis config from an explicit path or the default locations
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    AnalysisConfig::load(path).context("Failed to load analysis config")
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
