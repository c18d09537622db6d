//! Unmask Core Library
//!
//! Merchant unmasking and vendor analysis for card transactions:
//! - Payment processor detection and vendor extraction
//! - Vendor name normalization and canonical mapping
//! - Confidence scoring, fallback recovery and review suggestions
//! - Vendor aggregation into profiles
//! - Recurrence, subscription and fraud/anomaly analysis
//! - Canonical CSV/JSON transaction loading

pub mod analyze;
pub mod config;
pub mod error;
pub mod extract;
pub mod fraud;
pub mod import;
pub mod models;
pub mod normalize;
pub mod profile;
pub mod recurrence;
pub mod resolve;
pub mod rules;
pub mod subscription;
pub mod suggest;
pub mod unmask;

/// Transaction and profile builders for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use analyze::VendorAnalyzer;
pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use fraud::{FraudScorer, RiskAssessment};
pub use import::{load_transactions, parse_csv, parse_json, InputFormat};
pub use models::{
    AnalysisReport, Frequency, RecurrencePattern, ReviewItem, ReviewReason, SuspiciousCluster,
    Transaction, UnmaskResult, UnmaskSummary, UnmaskingMetadata, VendorProfile,
};
pub use normalize::Normalizer;
pub use rules::{ProcessorRule, PROCESSOR_RULES};
pub use unmask::Unmasker;
