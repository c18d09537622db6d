//! Analysis pipeline
//!
//! One call runs the whole batch:
//! 1. Unmask every transaction and build the unmasking summary
//! 2. Aggregate into vendor profiles
//! 3. Recurrence, then subscription, then fraud/anomaly scoring per profile
//!
//! Every call starts from fresh state, so the same input always yields the
//! same report.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::fraud::FraudScorer;
use crate::models::{
    AnalysisReport, ReviewItem, ReviewReason, SuspiciousCluster, Transaction, UnmaskResult,
    UnmaskSummary, VendorProfile,
};
use crate::profile::{Aggregator, TAG_ANOMALY, TAG_FRAUD, TAG_RECURRING, TAG_SUBSCRIPTION};
use crate::recurrence;
use crate::subscription;
use crate::unmask::Unmasker;

/// Runs the full pipeline over a batch of transactions
#[derive(Debug, Clone)]
pub struct VendorAnalyzer {
    unmasker: Unmasker,
    scorer: FraudScorer,
}

impl VendorAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Ok(Self {
            unmasker: Unmasker::new(config)?,
            scorer: FraudScorer::new()?,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.unmasker.config()
    }

    pub fn analyze(&self, transactions: &[Transaction]) -> AnalysisReport {
        let mut summary = SummaryBuilder::new(self.config());
        let mut aggregator = Aggregator::new(&self.unmasker);

        for transaction in transactions {
            let result = self.unmasker.unmask(transaction);
            let key = aggregator.add(transaction, &result);
            summary.record(&result, &key);
        }

        let mut profiles = aggregator.finish();
        for profile in profiles.values_mut() {
            self.classify(profile);
        }

        let summary = summary.finish();
        info!(
            "Analyzed {} transactions: {} vendors, {} obscured, {} need review, {} subscriptions, {} flagged",
            summary.total_transactions,
            profiles.len(),
            summary.total_obscured_count,
            summary.vendors_needing_review.len(),
            profiles.values().filter(|p| p.is_subscription).count(),
            profiles
                .values()
                .filter(|p| p.is_fraudulent || p.tags.contains(TAG_ANOMALY))
                .count(),
        );

        AnalysisReport { profiles, summary }
    }

    /// Recurrence, subscription and risk, strictly in that order
    fn classify(&self, profile: &mut VendorProfile) {
        let config = self.config();

        profile.recurrence_pattern = recurrence::detect(profile, config);
        if profile.is_recurring() {
            profile.tags.insert(TAG_RECURRING.to_string());
        }

        profile.is_subscription = subscription::is_subscription(profile, config);
        if profile.is_subscription {
            profile.tags.insert(TAG_SUBSCRIPTION.to_string());
        }

        let risk = self.scorer.assess(profile, config);
        profile.fraud_score = risk.fraud_score;
        profile.is_fraudulent = risk.is_fraudulent;
        profile.fraud_reasons = risk.reasons;
        profile.anomaly_score = risk.anomaly_score;
        if profile.is_fraudulent {
            profile.tags.insert(TAG_FRAUD.to_string());
        }
        if profile.anomaly_score > config.anomaly_tag_threshold {
            profile.tags.insert(TAG_ANOMALY.to_string());
        }

        if profile.is_fraudulent {
            debug!(
                "{} flagged (score {:.0}): {}",
                profile.display_name,
                risk.raw_score,
                profile.fraud_reasons.join("; ")
            );
        }
    }
}

/// Accumulates the unmasking summary during the scan
struct SummaryBuilder<'a> {
    config: &'a AnalysisConfig,
    summary: UnmaskSummary,
    clusters: BTreeMap<ReviewReason, SuspiciousCluster>,
}

impl<'a> SummaryBuilder<'a> {
    fn new(config: &'a AnalysisConfig) -> Self {
        Self {
            config,
            summary: UnmaskSummary::default(),
            clusters: BTreeMap::new(),
        }
    }

    /// Count one result; `vendor_key` is the profile it was aggregated into
    fn record(&mut self, result: &UnmaskResult, vendor_key: &str) {
        self.summary.total_transactions += 1;
        if result.is_obscured {
            self.summary.total_obscured_count += 1;
            *self
                .summary
                .counts_by_processor
                .entry(result.matched_processor.clone())
                .or_default() += 1;
        }

        if !result.needs_manual_review {
            return;
        }

        let review = &mut self.summary.vendors_needing_review;
        if review.len() < self.config.review_cap
            && !review.iter().any(|item| item.vendor_key == vendor_key)
        {
            review.push(ReviewItem {
                vendor_key: vendor_key.to_string(),
                description: result.original_description.clone(),
                processor: result.matched_processor.clone(),
                extracted_vendor: result.extracted_vendor_name.clone(),
                confidence: result.confidence,
                reason: result.review_reason,
                possible_vendors: result.possible_vendors.clone(),
            });
        }

        if let Some(reason) = result.review_reason {
            let cluster = self.clusters.entry(reason).or_insert_with(|| SuspiciousCluster {
                reason,
                count: 0,
                examples: Vec::new(),
            });
            cluster.count += 1;
            if cluster.examples.len() < self.config.cluster_examples
                && !cluster.examples.contains(&result.original_description)
            {
                cluster.examples.push(result.original_description.clone());
            }
        }
    }

    fn finish(mut self) -> UnmaskSummary {
        self.summary.suspicious_clusters = self.clusters.into_values().collect();
        self.summary
    }
}
