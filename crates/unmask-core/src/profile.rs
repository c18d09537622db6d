//! Vendor aggregation
//!
//! Groups transactions into one [`VendorProfile`] per canonical key. State is
//! owned by an [`Aggregator`] created for a single run; nothing is shared
//! between runs.

use std::collections::BTreeMap;

use crate::models::{Transaction, UnmaskResult, UnmaskingMetadata, VendorProfile};
use crate::unmask::Unmasker;

pub const TAG_RECURRING: &str = "recurring";
pub const TAG_SUBSCRIPTION: &str = "subscription";
pub const TAG_NEEDS_REVIEW: &str = "needs_review";
pub const TAG_FRAUD: &str = "fraud_risk";
pub const TAG_ANOMALY: &str = "anomaly_detected";

const PROCESSOR_TAG_PREFIX: &str = "processor:";

/// Tag recording that an obscuring processor handled one of the vendor's charges
pub fn processor_tag(processor: &str) -> String {
    format!("{}{}", PROCESSOR_TAG_PREFIX, processor.to_lowercase().replace(' ', "_"))
}

/// Per-run grouping of transactions by vendor identity
pub struct Aggregator<'a> {
    unmasker: &'a Unmasker,
    profiles: BTreeMap<String, VendorProfile>,
}

impl<'a> Aggregator<'a> {
    pub fn new(unmasker: &'a Unmasker) -> Self {
        Self {
            unmasker,
            profiles: BTreeMap::new(),
        }
    }

    /// Vendor name the transaction is grouped under
    pub fn vendor_name(&self, transaction: &Transaction, result: &UnmaskResult) -> String {
        let threshold = self.unmasker.config().obscured_confidence_threshold;
        if result.is_obscured && result.confidence > threshold {
            return result.extracted_vendor_name.clone();
        }

        let best_field = [
            transaction.statement_description.as_deref(),
            Some(transaction.description.as_str()),
            transaction.extended_details.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|field| !field.is_empty())
        .unwrap_or("");

        let name = self.unmasker.normalizer().display_name(best_field);
        if name.is_empty() {
            result.extracted_vendor_name.clone()
        } else {
            name
        }
    }

    /// Fold one unmasked transaction into its profile, creating it on first sight.
    ///
    /// Returns the profile key the transaction landed under.
    pub fn add(&mut self, transaction: &Transaction, result: &UnmaskResult) -> String {
        let name = self.vendor_name(transaction, result);
        let key = self.unmasker.normalizer().canonical_key(&name);
        let max_suggestions = self.unmasker.config().max_suggestions;

        let profile = self
            .profiles
            .entry(key.clone())
            .or_insert_with(|| VendorProfile::open(key.clone(), name, transaction, result));
        profile.record(transaction, result, max_suggestions);
        key
    }

    /// Date-sort every profile and derive averages
    pub fn finish(self) -> BTreeMap<String, VendorProfile> {
        let mut profiles = self.profiles;
        for profile in profiles.values_mut() {
            profile.transactions.sort_by_key(|t| t.date);
            profile.average_amount = if profile.transaction_count > 0 {
                profile.total_amount / profile.transaction_count as f64
            } else {
                0.0
            };
        }
        profiles
    }
}

impl VendorProfile {
    /// Empty profile seeded with the first transaction's date and amount
    fn open(
        canonical_key: String,
        display_name: String,
        transaction: &Transaction,
        result: &UnmaskResult,
    ) -> Self {
        Self {
            canonical_key,
            display_name,
            total_amount: 0.0,
            transaction_count: 0,
            first_seen: transaction.date,
            last_seen: transaction.date,
            min_amount: transaction.amount,
            max_amount: transaction.amount,
            average_amount: 0.0,
            recurrence_pattern: None,
            is_subscription: false,
            anomaly_score: 0.0,
            fraud_score: 0.0,
            is_fraudulent: false,
            fraud_reasons: Vec::new(),
            tags: Default::default(),
            unmasking_metadata: UnmaskingMetadata {
                lowest_confidence: result.confidence,
                ..Default::default()
            },
            transactions: Vec::new(),
        }
    }

    fn record(&mut self, transaction: &Transaction, result: &UnmaskResult, max_suggestions: usize) {
        self.total_amount += transaction.amount;
        self.transaction_count += 1;
        self.first_seen = self.first_seen.min(transaction.date);
        self.last_seen = self.last_seen.max(transaction.date);
        self.min_amount = self.min_amount.min(transaction.amount);
        self.max_amount = self.max_amount.max(transaction.amount);
        self.transactions.push(transaction.clone());

        let meta = &mut self.unmasking_metadata;
        meta.lowest_confidence = meta.lowest_confidence.min(result.confidence);
        if result.is_obscured {
            *meta
                .processors
                .entry(result.matched_processor.clone())
                .or_default() += 1;
            self.tags.insert(processor_tag(&result.matched_processor));
        }
        if result.needs_manual_review {
            meta.needs_review = true;
            self.tags.insert(TAG_NEEDS_REVIEW.to_string());
        }
        for vendor in &result.possible_vendors {
            if meta.possible_vendors.len() >= max_suggestions {
                break;
            }
            if !meta.possible_vendors.contains(vendor) {
                meta.possible_vendors.push(vendor.clone());
            }
        }
    }
}
