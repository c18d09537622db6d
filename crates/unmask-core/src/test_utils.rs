//! Test utilities for unmask-core
//!
//! Transaction and profile builders shared by the core unit tests, the
//! integration tests and the CLI tests.

use chrono::{Duration, NaiveDate};

use crate::models::{Transaction, UnmaskingMetadata, VendorProfile};

/// Parse a `YYYY-MM-DD` literal
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Transaction with just a date, description and amount
pub fn tx(on: &str, description: &str, amount: f64) -> Transaction {
    Transaction::new(date(on), description, amount)
}

/// `count` charges of `amount`, `every_days` apart, starting at `start`
pub fn series(
    start: &str,
    every_days: i64,
    count: usize,
    description: &str,
    amount: f64,
) -> Vec<Transaction> {
    let first = date(start);
    (0..count)
        .map(|i| {
            Transaction::new(
                first + Duration::days(every_days * i as i64),
                description,
                amount,
            )
        })
        .collect()
}

/// Finalized profile built directly from transactions, bypassing unmasking
pub fn profile_with(key: &str, mut transactions: Vec<Transaction>) -> VendorProfile {
    transactions.sort_by_key(|t| t.date);
    let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
    let total: f64 = amounts.iter().sum();
    let count = transactions.len();

    VendorProfile {
        canonical_key: key.to_string(),
        display_name: crate::normalize::title_case(key),
        total_amount: total,
        transaction_count: count,
        first_seen: transactions.first().map(|t| t.date).unwrap(),
        last_seen: transactions.last().map(|t| t.date).unwrap(),
        min_amount: amounts.iter().cloned().fold(f64::INFINITY, f64::min),
        max_amount: amounts.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        average_amount: if count > 0 { total / count as f64 } else { 0.0 },
        recurrence_pattern: None,
        is_subscription: false,
        anomaly_score: 0.0,
        fraud_score: 0.0,
        is_fraudulent: false,
        fraud_reasons: Vec::new(),
        tags: Default::default(),
        unmasking_metadata: UnmaskingMetadata::default(),
        transactions,
    }
}

/// Canonical CSV with one row per transaction
pub fn to_csv(transactions: &[Transaction]) -> String {
    let mut out = String::from("date,description,amount,extended_details,statement_description,category\n");
    for t in transactions {
        out.push_str(&format!(
            "{},\"{}\",{:.2},\"{}\",\"{}\",\"{}\"\n",
            t.date,
            t.description,
            t.amount,
            t.extended_details.as_deref().unwrap_or(""),
            t.statement_description.as_deref().unwrap_or(""),
            t.category.as_deref().unwrap_or(""),
        ));
    }
    out
}
