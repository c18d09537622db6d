//! Processors command implementation

use anyhow::Result;
use unmask_core::PROCESSOR_RULES;

pub fn cmd_processors() -> Result<()> {
    println!();
    println!("💳 Recognized Processors (checked in this order)");
    println!("   ─────────────────────────────────────────────────────────────");

    for rule in PROCESSOR_RULES {
        println!(
            "   {:10} │ {:.2} │ {:10} │ {}",
            rule.name,
            rule.base_confidence,
            rule.strategy.as_str(),
            rule.signatures.join("  ")
        );
    }

    println!();
    println!("   Processors below 0.80 always need manual review.");
    println!();

    Ok(())
}
