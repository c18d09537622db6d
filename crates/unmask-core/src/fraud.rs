//! Fraud and anomaly scoring
//!
//! Both scores are additive rule sums. The fraud score is kept on a 0-100
//! scale (capped) and feeds the anomaly score through `max(sum, fraud / 100)`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use regex::Regex;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::VendorProfile;
use crate::recurrence::mean_and_std_dev;
use crate::rules::{is_generic_term, BLACKLIST_KEYWORDS, SCAM_PATTERNS, SUSPICIOUS_AMOUNTS};

const SUSPICIOUS_AMOUNT_POINTS: f64 = 20.0;
const SAME_DAY_POINTS: f64 = 50.0;
const BLACKLIST_POINTS: f64 = 30.0;
const SCAM_PATTERN_POINTS: f64 = 40.0;
const GENERIC_NAME_POINTS: f64 = 25.0;
const MAX_FRAUD_SCORE: f64 = 100.0;

const SPREAD_ANOMALY: f64 = 0.2;
const SPIKE_ANOMALY: f64 = 0.3;
const CADENCE_ANOMALY: f64 = 0.15;
/// Relative deviation of the latest gap from the cadence that counts as a break
const CADENCE_TOLERANCE: f64 = 0.3;

/// Scores for one profile
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// Uncapped rule total
    pub raw_score: f64,
    /// Rule total capped to 100
    pub fraud_score: f64,
    pub is_fraudulent: bool,
    /// One entry per rule that fired, in rule order
    pub reasons: Vec<String>,
    /// Always within [0, 1]
    pub anomaly_score: f64,
}

/// Rule-based scorer with scam patterns compiled once
#[derive(Debug, Clone)]
pub struct FraudScorer {
    scam_patterns: Vec<Regex>,
}

impl FraudScorer {
    pub fn new() -> Result<Self> {
        let scam_patterns = SCAM_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { scam_patterns })
    }

    pub fn assess(&self, profile: &VendorProfile, config: &AnalysisConfig) -> RiskAssessment {
        let (raw_score, reasons) = self.fraud_rules(profile, config);
        let fraud_score = raw_score.min(MAX_FRAUD_SCORE);
        let anomaly = anomaly_sum(profile);

        RiskAssessment {
            raw_score,
            fraud_score,
            is_fraudulent: raw_score > config.fraud_threshold,
            reasons,
            anomaly_score: anomaly.max(fraud_score / MAX_FRAUD_SCORE).clamp(0.0, 1.0),
        }
    }

    fn fraud_rules(&self, profile: &VendorProfile, config: &AnalysisConfig) -> (f64, Vec<String>) {
        let mut score = 0.0;
        let mut reasons = Vec::new();

        let suspicious: Vec<f64> = profile
            .transactions
            .iter()
            .map(|t| t.amount)
            .filter(|a| is_suspicious_amount(*a))
            .collect();
        if !suspicious.is_empty() {
            score += SUSPICIOUS_AMOUNT_POINTS * suspicious.len() as f64;
            reasons.push(format!(
                "{} charge(s) at known card-testing amounts (${:.2})",
                suspicious.len(),
                suspicious[0]
            ));
        }

        if let Some((day, count, total)) = same_day_burst(profile, config.same_day_threshold) {
            score += SAME_DAY_POINTS;
            reasons.push(format!(
                "{} charges totalling ${:.2} on {}",
                count, total, day
            ));
        }

        let name = format!("{} {}", profile.display_name, profile.canonical_key).to_lowercase();
        if let Some(keyword) = BLACKLIST_KEYWORDS.iter().find(|k| name.contains(*k)) {
            score += BLACKLIST_POINTS;
            reasons.push(format!("Vendor name contains \"{}\"", keyword));
        }

        if self
            .scam_patterns
            .iter()
            .any(|re| re.is_match(&profile.display_name))
        {
            score += SCAM_PATTERN_POINTS;
            reasons.push("Vendor name matches a known scam pattern".to_string());
        }

        if is_generic_term(&profile.display_name) || is_generic_term(&profile.canonical_key) {
            score += GENERIC_NAME_POINTS;
            reasons.push("Vendor name is a generic term".to_string());
        }

        (score, reasons)
    }
}

fn is_suspicious_amount(amount: f64) -> bool {
    SUSPICIOUS_AMOUNTS.iter().any(|s| (amount - s).abs() < 0.005)
}

/// Earliest day with two or more charges whose total exceeds `threshold`
fn same_day_burst(profile: &VendorProfile, threshold: f64) -> Option<(NaiveDate, usize, f64)> {
    let mut by_day: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for t in &profile.transactions {
        let entry = by_day.entry(t.date).or_default();
        entry.0 += 1;
        entry.1 += t.amount;
    }

    by_day
        .into_iter()
        .find(|(_, (count, total))| *count >= 2 && *total > threshold)
        .map(|(day, (count, total))| (day, count, total))
}

fn anomaly_sum(profile: &VendorProfile) -> f64 {
    let amounts = profile.amounts();
    let average = profile.average_amount;
    let mut sum = 0.0;

    let (_, std_dev) = mean_and_std_dev(&amounts);
    if average > 0.0 && std_dev > 0.5 * average {
        sum += SPREAD_ANOMALY;
    }

    if let Some(latest) = profile.latest_transaction() {
        if average > 0.0 && latest.amount > 2.0 * average {
            sum += SPIKE_ANOMALY;
        }
    }

    if let Some(pattern) = &profile.recurrence_pattern {
        let n = profile.transactions.len();
        if n >= 2 {
            let latest_gap = (profile.transactions[n - 1].date - profile.transactions[n - 2].date)
                .num_days() as f64;
            let nominal = pattern.frequency.nominal_days() as f64;
            if (latest_gap - nominal).abs() / nominal > CADENCE_TOLERANCE {
                sum += CADENCE_ANOMALY;
            }
        }
    }

    sum.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, RecurrencePattern};
    use crate::test_utils::{date, profile_with, series, tx};

    fn assess(profile: &VendorProfile) -> RiskAssessment {
        FraudScorer::new()
            .unwrap()
            .assess(profile, &AnalysisConfig::default())
    }

    #[test]
    fn test_same_day_suspicious_amounts() {
        let profile = profile_with(
            "new vendor",
            vec![
                tx("2024-05-02", "NEW VENDOR", 999.00),
                tx("2024-05-02", "NEW VENDOR", 999.00),
            ],
        );
        let r = assess(&profile);
        assert_eq!(r.raw_score, 90.0);
        assert!(r.fraud_score >= 70.0);
        assert!(r.is_fraudulent);
        assert_eq!(r.reasons.len(), 2);
        assert!((r.anomaly_score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_same_day_rule_counts_once() {
        let profile = profile_with(
            "electronics hub",
            vec![
                tx("2024-05-02", "ELECTRONICS HUB", 400.0),
                tx("2024-05-02", "ELECTRONICS HUB", 400.0),
                tx("2024-05-09", "ELECTRONICS HUB", 300.0),
                tx("2024-05-09", "ELECTRONICS HUB", 300.0),
            ],
        );
        let r = assess(&profile);
        assert_eq!(r.raw_score, 50.0);
        assert!(!r.is_fraudulent);
    }

    #[test]
    fn test_score_is_capped() {
        let mut transactions = series("2024-05-01", 0, 6, "CRYPTO PRIZE CENTER", 0.01);
        transactions.push(tx("2024-05-01", "CRYPTO PRIZE CENTER", 999.99));
        let profile = profile_with("crypto prize center", transactions);
        let r = assess(&profile);
        assert!(r.raw_score > MAX_FRAUD_SCORE);
        assert_eq!(r.fraud_score, MAX_FRAUD_SCORE);
        assert_eq!(r.anomaly_score, 1.0);
        assert!(r.reasons.iter().any(|m| m.contains("crypto")));
        assert!(r.reasons.iter().any(|m| m.contains("scam")));
    }

    #[test]
    fn test_generic_name() {
        let profile = profile_with("payment", vec![tx("2024-05-01", "PAYMENT", 20.0)]);
        let r = assess(&profile);
        assert_eq!(r.raw_score, 25.0);
        assert!(!r.is_fraudulent);
    }

    #[test]
    fn test_clean_vendor_scores_zero() {
        let profile = profile_with("netflix", series("2024-01-01", 30, 6, "NETFLIX", 15.99));
        let r = assess(&profile);
        assert_eq!(r.raw_score, 0.0);
        assert_eq!(r.anomaly_score, 0.0);
        assert!(r.reasons.is_empty());
    }

    #[test]
    fn test_price_spike_and_spread() {
        let profile = profile_with(
            "city power",
            vec![
                tx("2024-01-01", "CITY POWER", 10.0),
                tx("2024-02-01", "CITY POWER", 10.0),
                tx("2024-03-01", "CITY POWER", 10.0),
                tx("2024-04-01", "CITY POWER", 90.0),
            ],
        );
        // average 30, std dev ~34.6, latest 90 > 60
        let r = assess(&profile);
        assert!((r.anomaly_score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_cadence_break() {
        let mut transactions = series("2024-01-01", 30, 5, "STREAMBOX", 12.0);
        transactions.push(tx("2024-07-15", "STREAMBOX", 12.0));
        let mut profile = profile_with("streambox", transactions);
        profile.recurrence_pattern = Some(RecurrencePattern {
            frequency: Frequency::Monthly,
            expected_amount: 12.0,
            interval_variance: 0.0,
            confidence: 0.95,
            next_expected_date: date("2024-08-14"),
        });
        let r = assess(&profile);
        assert!((r.anomaly_score - CADENCE_ANOMALY).abs() < 1e-9);
    }
}
