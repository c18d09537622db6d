//! Subscription classification
//!
//! A vendor is a subscription when its name says so, or when it bills on a
//! confident monthly/quarterly/annual cadence at a consistent price.

use std::collections::BTreeSet;

use crate::config::AnalysisConfig;
use crate::models::VendorProfile;
use crate::rules::has_subscription_keyword;

/// Decide the subscription flag for a profile with recurrence already attached
pub fn is_subscription(profile: &VendorProfile, config: &AnalysisConfig) -> bool {
    keyword_signal(profile) || cadence_signal(profile, config)
}

fn keyword_signal(profile: &VendorProfile) -> bool {
    has_subscription_keyword(&profile.display_name)
        || profile
            .latest_transaction()
            .is_some_and(|t| has_subscription_keyword(&t.description))
}

fn cadence_signal(profile: &VendorProfile, config: &AnalysisConfig) -> bool {
    profile.recurrence_pattern.as_ref().is_some_and(|pattern| {
        pattern.confidence > config.subscription_min_confidence
            && pattern.frequency.is_billing_cycle()
            && amounts_consistent(&profile.amounts(), profile.transaction_count)
    })
}

/// All charges identical, or at most two distinct prices across more than three charges
pub fn amounts_consistent(amounts: &[f64], transaction_count: usize) -> bool {
    let distinct: BTreeSet<i64> = amounts.iter().map(|a| (a * 100.0).round() as i64).collect();
    distinct.len() == 1 || (distinct.len() <= 2 && transaction_count > 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, RecurrencePattern};
    use crate::test_utils::{date, profile_with, series, tx};

    fn with_pattern(mut profile: VendorProfile, frequency: Frequency, confidence: f64) -> VendorProfile {
        profile.recurrence_pattern = Some(RecurrencePattern {
            frequency,
            expected_amount: profile.average_amount,
            interval_variance: 0.0,
            confidence,
            next_expected_date: date("2025-01-01"),
        });
        profile
    }

    #[test]
    fn test_amounts_consistent() {
        assert!(amounts_consistent(&[15.99, 15.99], 2));
        assert!(amounts_consistent(&[15.99, 15.99, 17.99, 17.99], 4));
        assert!(!amounts_consistent(&[15.99, 17.99, 17.99], 3));
        assert!(!amounts_consistent(&[10.0, 11.0, 12.0, 13.0], 4));
    }

    #[test]
    fn test_monthly_consistent_price() {
        let profile = profile_with("riverside yoga", series("2024-01-01", 30, 6, "RIVERSIDE YOGA", 40.0));
        let profile = with_pattern(profile, Frequency::Monthly, 0.95);
        assert!(is_subscription(&profile, &AnalysisConfig::default()));
    }

    #[test]
    fn test_weekly_habit_is_not_a_subscription() {
        let profile = profile_with("corner bakery", series("2024-01-01", 7, 8, "CORNER BAKERY", 6.0));
        let profile = with_pattern(profile, Frequency::Weekly, 0.9);
        assert!(!is_subscription(&profile, &AnalysisConfig::default()));
    }

    #[test]
    fn test_quarterly_at_threshold_is_not_enough() {
        let profile = profile_with("acme storage", series("2024-01-01", 91, 4, "ACME STORAGE", 30.0));
        let profile = with_pattern(profile, Frequency::Quarterly, 0.8);
        assert!(!is_subscription(&profile, &AnalysisConfig::default()));
    }

    #[test]
    fn test_keyword_on_name_or_latest_description() {
        let by_name = profile_with("spotify", vec![tx("2024-01-01", "SPOTIFY", 11.99)]);
        assert!(is_subscription(&by_name, &AnalysisConfig::default()));

        let by_description = profile_with(
            "city fitness",
            vec![
                tx("2024-01-01", "CITY FITNESS", 5.0),
                tx("2024-02-01", "CITY FITNESS MEMBERSHIP FEE", 45.0),
            ],
        );
        assert!(is_subscription(&by_description, &AnalysisConfig::default()));

        let plain = profile_with("hardware barn", vec![tx("2024-01-01", "HARDWARE BARN", 23.0)]);
        assert!(!is_subscription(&plain, &AnalysisConfig::default()));
    }
}
