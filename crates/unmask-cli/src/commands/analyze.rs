//! Analyze command implementation

use std::path::Path;

use anyhow::{Context, Result};
use unmask_core::{load_transactions, AnalysisReport, InputFormat, VendorAnalyzer};

use super::{load_config, truncate};

/// Vendors shown in the table view
const TOP_VENDORS: usize = 15;

/// Load `file` and run one analysis over it
pub fn run_analysis(
    file: &Path,
    format: Option<&str>,
    config_path: Option<&Path>,
) -> Result<AnalysisReport> {
    let format = format
        .map(|f| f.parse::<InputFormat>().map_err(anyhow::Error::msg))
        .transpose()?;

    let config = load_config(config_path)?;
    let analyzer = VendorAnalyzer::new(config).context("Failed to compile rule tables")?;

    let transactions = load_transactions(file, format)
        .with_context(|| format!("Failed to load transactions from {}", file.display()))?;

    Ok(analyzer.analyze(&transactions))
}

pub fn cmd_analyze(
    file: &Path,
    format: Option<&str>,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let report = run_analysis(file, format, config_path)?;

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", out);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    let summary = &report.summary;

    println!();
    println!("🔍 Unmask Report");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Transactions:  {}", summary.total_transactions);
    println!("   Vendors:       {}", report.profiles.len());
    println!("   Obscured:      {}", summary.total_obscured_count);

    if !summary.counts_by_processor.is_empty() {
        println!();
        println!("💳 Processors");
        for (processor, count) in &summary.counts_by_processor {
            println!("   {:14} {:>5}", processor, count);
        }
    }

    let mut vendors: Vec<_> = report.profiles.values().collect();
    vendors.sort_by(|a, b| {
        b.total_amount
            .partial_cmp(&a.total_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!();
    println!("🏪 Top Vendors");
    for p in vendors.iter().take(TOP_VENDORS) {
        let cadence = p
            .recurrence_pattern
            .as_ref()
            .map(|r| r.frequency.as_str())
            .unwrap_or("-");
        println!(
            "   {:24} │ {:>4} tx │ {:>10} │ {:9}",
            truncate(&p.display_name, 24),
            p.transaction_count,
            format!("${:.2}", p.total_amount),
            cadence
        );
    }

    let subscriptions: Vec<_> = report.subscriptions().collect();
    if !subscriptions.is_empty() {
        println!();
        println!("📋 Subscriptions");
        for p in subscriptions {
            let next = p
                .recurrence_pattern
                .as_ref()
                .map(|r| format!("next ~{}", r.next_expected_date))
                .unwrap_or_default();
            println!(
                "   {:24} │ {:>9} avg │ {}",
                truncate(&p.display_name, 24),
                format!("${:.2}", p.average_amount),
                next
            );
        }
    }

    let flagged: Vec<_> = report.flagged().collect();
    if !flagged.is_empty() {
        println!();
        println!("🚨 Flagged");
        for p in flagged {
            println!(
                "   {:24} │ fraud {:>3.0} │ anomaly {:.2}",
                truncate(&p.display_name, 24),
                p.fraud_score,
                p.anomaly_score
            );
            for reason in &p.fraud_reasons {
                println!("      - {}", reason);
            }
        }
    }

    if !summary.vendors_needing_review.is_empty() {
        println!();
        println!("⚠️  Needs Review ({})", summary.vendors_needing_review.len());
        for item in &summary.vendors_needing_review {
            let reason = item.reason.map(|r| r.as_str()).unwrap_or("-");
            println!(
                "   {:24} │ {:10} │ {:.2} │ {}",
                truncate(&item.description, 24),
                item.processor,
                item.confidence,
                reason
            );
        }
    }

    if !summary.suspicious_clusters.is_empty() {
        println!();
        println!("🧩 Suspicious Extractions");
        for cluster in &summary.suspicious_clusters {
            println!(
                "   {:24} │ {:>4} │ e.g. {}",
                cluster.reason.as_str(),
                cluster.count,
                cluster.examples.join(", ")
            );
        }
    }

    println!();
}
