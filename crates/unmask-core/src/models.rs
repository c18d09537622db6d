//! Domain models for unmask

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A card transaction as supplied by the ingestion layer.
///
/// Amounts are non-negative: the loader stores absolute values so that
/// charges and refunds of the same size aggregate the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Raw merchant description as printed on the statement line
    pub description: String,
    /// Extended details column some issuers provide (address, phone, memo)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_details: Option<String>,
    /// "Appears on your statement as" text, when distinct from the description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_description: Option<String>,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: f64) -> Self {
        Self {
            date,
            description: description.into(),
            extended_details: None,
            statement_description: None,
            amount,
            category: None,
        }
    }

    pub fn with_extended_details(mut self, details: impl Into<String>) -> Self {
        self.extended_details = Some(details.into());
        self
    }

    pub fn with_statement_description(mut self, statement: impl Into<String>) -> Self {
        self.statement_description = Some(statement.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// All descriptive text for this transaction joined with spaces.
    ///
    /// Order: raw description, extended details, statement description.
    pub fn context(&self) -> String {
        let mut parts = vec![self.description.as_str()];
        if let Some(details) = self.extended_details.as_deref() {
            parts.push(details);
        }
        if let Some(statement) = self.statement_description.as_deref() {
            parts.push(statement);
        }
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Repeat-charge cadence buckets, in detection priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }

    /// Nominal number of days between charges
    pub fn nominal_days(&self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Biweekly => 14,
            Self::Monthly => 30,
            Self::Quarterly => 91,
            Self::Annual => 365,
        }
    }

    /// Cadences that read as a paid plan rather than a habit
    pub fn is_billing_cycle(&self) -> bool {
        matches!(self, Self::Monthly | Self::Quarterly | Self::Annual)
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an unmask result was routed to manual review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
    /// Extraction produced nothing usable
    EmptyExtraction,
    /// Extraction is only digits (terminal or order id)
    AllDigits,
    /// Extraction is a 2-4 letter code
    ShortCode,
    /// Extraction shorter than three characters
    TooShort,
    /// Extraction is a generic word like "payment"
    GenericTerm,
    /// Processor is too unreliable to trust on its own
    LowBaseConfidence,
    /// No processor matched but the descriptor looks masked
    UnrecognizedDescriptor,
}

impl ReviewReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyExtraction => "empty_extraction",
            Self::AllDigits => "all_digits",
            Self::ShortCode => "short_code",
            Self::TooShort => "too_short",
            Self::GenericTerm => "generic_term",
            Self::LowBaseConfidence => "low_base_confidence",
            Self::UnrecognizedDescriptor => "unrecognized_descriptor",
        }
    }
}

impl std::fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of unmasking a single transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmaskResult {
    pub original_description: String,
    /// Processor name from the rule table, "Direct" or "Unknown"
    pub matched_processor: String,
    pub extracted_vendor_name: String,
    /// Always within [0, 1]
    pub confidence: f64,
    /// True when a processor (or an unrecognized masked descriptor) hides the merchant
    pub is_obscured: bool,
    pub needs_manual_review: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_reason: Option<ReviewReason>,
    /// Ordered, deduplicated, at most five entries
    pub possible_vendors: Vec<String>,
    pub inferred_category: String,
}

/// Detected repeat-charge pattern for a vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub expected_amount: f64,
    /// Population standard deviation of the day gaps
    pub interval_variance: f64,
    pub confidence: f64,
    pub next_expected_date: NaiveDate,
}

/// How the transactions behind a profile were unmasked
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnmaskingMetadata {
    /// Obscuring processors seen, with member counts
    pub processors: BTreeMap<String, usize>,
    pub lowest_confidence: f64,
    pub needs_review: bool,
    pub possible_vendors: Vec<String>,
}

/// Running profile of everything charged by one vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorProfile {
    pub canonical_key: String,
    pub display_name: String,
    pub total_amount: f64,
    pub transaction_count: usize,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub min_amount: f64,
    pub max_amount: f64,
    /// total_amount / transaction_count, set when aggregation finishes
    pub average_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub is_subscription: bool,
    pub anomaly_score: f64,
    /// Fraud score capped to 0-100
    pub fraud_score: f64,
    pub is_fraudulent: bool,
    pub fraud_reasons: Vec<String>,
    pub tags: BTreeSet<String>,
    pub unmasking_metadata: UnmaskingMetadata,
    /// Member transactions, date-sorted once aggregation finishes
    pub transactions: Vec<Transaction>,
}

impl VendorProfile {
    pub fn is_recurring(&self) -> bool {
        self.recurrence_pattern.is_some()
    }

    /// Most recent transaction (profiles are date-sorted after aggregation)
    pub fn latest_transaction(&self) -> Option<&Transaction> {
        self.transactions.last()
    }

    pub fn amounts(&self) -> Vec<f64> {
        self.transactions.iter().map(|t| t.amount).collect()
    }
}

/// A transaction whose unmasking needs a human look
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Profile key of the vendor under review; one item per key
    pub vendor_key: String,
    pub description: String,
    pub processor: String,
    pub extracted_vendor: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReviewReason>,
    pub possible_vendors: Vec<String>,
}

/// Review items grouped by the reason extraction looked suspicious
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousCluster {
    pub reason: ReviewReason,
    pub count: usize,
    pub examples: Vec<String>,
}

/// Aggregate view of how descriptions were unmasked in one run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnmaskSummary {
    pub total_transactions: usize,
    pub total_obscured_count: usize,
    pub counts_by_processor: BTreeMap<String, usize>,
    pub vendors_needing_review: Vec<ReviewItem>,
    pub suspicious_clusters: Vec<SuspiciousCluster>,
}

/// Everything one analysis run produces
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub profiles: BTreeMap<String, VendorProfile>,
    pub summary: UnmaskSummary,
}

impl AnalysisReport {
    pub fn subscriptions(&self) -> impl Iterator<Item = &VendorProfile> {
        self.profiles.values().filter(|p| p.is_subscription)
    }

    pub fn flagged(&self) -> impl Iterator<Item = &VendorProfile> {
        self.profiles
            .values()
            .filter(|p| p.is_fraudulent || p.tags.contains(crate::profile::TAG_ANOMALY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_context_order() {
        let tx = Transaction::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "PAYPAL *SHOP",
            10.0,
        )
        .with_extended_details("support@shop.example")
        .with_statement_description("  ");

        assert_eq!(tx.context(), "PAYPAL *SHOP support@shop.example");
    }

    #[test]
    fn test_frequency_display() {
        assert_eq!(Frequency::Biweekly.to_string(), "biweekly");
        assert_eq!(Frequency::Annual.as_str(), "annual");
    }

    #[test]
    fn test_billing_cycles() {
        assert!(Frequency::Monthly.is_billing_cycle());
        assert!(Frequency::Annual.is_billing_cycle());
        assert!(!Frequency::Weekly.is_billing_cycle());
    }
}
