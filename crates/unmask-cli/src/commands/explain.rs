//! Explain command implementation

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use unmask_core::{Transaction, UnmaskResult, Unmasker};

use super::load_config;

/// Unmask one description with optional amount and memo text
pub fn explain(
    description: &str,
    amount: Option<f64>,
    details: Option<&str>,
    config_path: Option<&Path>,
) -> Result<UnmaskResult> {
    let config = load_config(config_path)?;
    let unmasker = Unmasker::new(config).context("Failed to compile rule tables")?;

    if amount.is_none() && details.is_none() {
        return Ok(unmasker.unmask_description(description));
    }

    let mut transaction = Transaction::new(
        Local::now().date_naive(),
        description,
        amount.unwrap_or(0.0).abs(),
    );
    if let Some(details) = details {
        transaction = transaction.with_extended_details(details);
    }
    Ok(unmasker.unmask(&transaction))
}

pub fn cmd_explain(
    description: &str,
    amount: Option<f64>,
    details: Option<&str>,
    config_path: Option<&Path>,
) -> Result<()> {
    let r = explain(description, amount, details, config_path)?;

    let icon = if !r.is_obscured {
        "✅"
    } else if r.needs_manual_review {
        "⚠️ "
    } else {
        "🔓"
    };

    println!();
    println!("{} {}", icon, r.original_description);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Processor:   {}", r.matched_processor);
    println!("   Vendor:      {}", r.extracted_vendor_name);
    println!("   Confidence:  {:.2}", r.confidence);
    println!("   Category:    {}", r.inferred_category);
    if r.needs_manual_review {
        let reason = r.review_reason.map(|r| r.as_str()).unwrap_or("-");
        println!("   Review:      yes ({})", reason);
    }
    if !r.possible_vendors.is_empty() {
        println!("   Suggestions:");
        for s in &r.possible_vendors {
            println!("     - {}", s);
        }
    }
    println!();

    Ok(())
}
