//! Recurrence detection
//!
//! Classifies the day gaps between a vendor's charges into fixed cadence
//! buckets. Patterns are always derived from the full history.

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::models::{Frequency, RecurrencePattern, VendorProfile};

/// A cadence bucket: mean gap range, spread ceiling and the confidence it earns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub frequency: Frequency,
    pub min_mean_days: f64,
    pub max_mean_days: f64,
    pub max_std_dev: f64,
    pub confidence: f64,
}

impl Bucket {
    pub fn matches(&self, mean: f64, std_dev: f64) -> bool {
        (self.min_mean_days..=self.max_mean_days).contains(&mean) && std_dev <= self.max_std_dev
    }
}

/// Checked in order; the first match wins
pub const BUCKETS: &[Bucket] = &[
    Bucket {
        frequency: Frequency::Daily,
        min_mean_days: 0.5,
        max_mean_days: 1.5,
        max_std_dev: 0.5,
        confidence: 0.85,
    },
    Bucket {
        frequency: Frequency::Weekly,
        min_mean_days: 6.0,
        max_mean_days: 8.0,
        max_std_dev: 1.5,
        confidence: 0.9,
    },
    Bucket {
        frequency: Frequency::Biweekly,
        min_mean_days: 13.0,
        max_mean_days: 15.0,
        max_std_dev: 2.0,
        confidence: 0.85,
    },
    Bucket {
        frequency: Frequency::Monthly,
        min_mean_days: 27.0,
        max_mean_days: 33.0,
        max_std_dev: 3.5,
        confidence: 0.95,
    },
    Bucket {
        frequency: Frequency::Quarterly,
        min_mean_days: 85.0,
        max_mean_days: 97.0,
        max_std_dev: 7.0,
        confidence: 0.85,
    },
    Bucket {
        frequency: Frequency::Annual,
        min_mean_days: 355.0,
        max_mean_days: 375.0,
        max_std_dev: 10.0,
        confidence: 0.9,
    },
];

/// Gap statistics over a date series
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalStats {
    pub gaps: Vec<i64>,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

/// Day gaps between consecutive dates, sorted first. None for fewer than two dates.
pub fn interval_stats(dates: &[NaiveDate]) -> Option<IntervalStats> {
    if dates.len() < 2 {
        return None;
    }

    let mut sorted = dates.to_vec();
    sorted.sort();

    let gaps: Vec<i64> = sorted
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .collect();
    let (mean, std_dev) = mean_and_std_dev(&gaps.iter().map(|&g| g as f64).collect::<Vec<_>>());

    Some(IntervalStats {
        gaps,
        mean,
        std_dev,
    })
}

/// Mean and population standard deviation; zeros for an empty slice
pub fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// First bucket matching the gap statistics
pub fn classify(mean: f64, std_dev: f64) -> Option<&'static Bucket> {
    BUCKETS.iter().find(|b| b.matches(mean, std_dev))
}

/// Recurrence pattern for a finalized profile, if its charges repeat on a cadence
pub fn detect(profile: &VendorProfile, config: &AnalysisConfig) -> Option<RecurrencePattern> {
    if profile.transaction_count < 2 {
        return None;
    }

    let dates: Vec<NaiveDate> = profile.transactions.iter().map(|t| t.date).collect();
    let stats = interval_stats(&dates)?;
    let bucket = classify(stats.mean, stats.std_dev)?;

    if bucket.confidence <= config.recurrence_min_confidence {
        return None;
    }

    debug!(
        "{}: {} (mean gap {:.1}d, std dev {:.2})",
        profile.display_name, bucket.frequency, stats.mean, stats.std_dev
    );

    Some(RecurrencePattern {
        frequency: bucket.frequency,
        expected_amount: profile.average_amount,
        interval_variance: stats.std_dev,
        confidence: bucket.confidence,
        next_expected_date: profile.last_seen + Duration::days(stats.mean.round() as i64),
    })
}
