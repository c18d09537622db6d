//! Confidence resolution for processor extractions
//!
//! A matched processor starts at its base confidence. Extractions that look
//! degenerate (ids, short codes, generic words) are penalized and routed to
//! review; processors whose base confidence is below [`TRUSTED_BASE_CONFIDENCE`]
//! always go to review.

use crate::config::AnalysisConfig;
use crate::extract::{CompiledRule, Extractor};
use crate::models::ReviewReason;
use crate::normalize::Normalizer;
use crate::rules::{canonical_vendor, is_generic_term, UNKNOWN_VENDOR};

/// Base confidence at or above which a processor is trusted without review
pub const TRUSTED_BASE_CONFIDENCE: f64 = 0.8;

/// Confidence assigned when a processor matched but nothing was extracted
pub const EMPTY_EXTRACTION_CONFIDENCE: f64 = 0.1;

/// Resolved vendor name and confidence for one extraction
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub vendor_name: String,
    pub confidence: f64,
    pub needs_manual_review: bool,
    pub review_reason: Option<ReviewReason>,
}

/// Why `raw` is not a trustworthy vendor name, if it isn't
pub fn extraction_quality(
    raw: &str,
    canonical_known: bool,
    extractor: &Extractor,
) -> Option<ReviewReason> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(ReviewReason::EmptyExtraction);
    }

    let significant: Vec<char> = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '#' | '-'))
        .collect();
    if !significant.is_empty() && significant.iter().all(|c| c.is_ascii_digit()) {
        return Some(ReviewReason::AllDigits);
    }

    if raw.chars().count() < 3 {
        return Some(ReviewReason::TooShort);
    }

    // "EBAY" is a short code that is also a known vendor
    let len = raw.chars().count();
    if (2..=4).contains(&len) && raw.chars().all(|c| c.is_ascii_uppercase()) && !canonical_known
    {
        return Some(ReviewReason::ShortCode);
    }

    if is_generic_term(raw) || extractor.has_generic_word(raw) {
        return Some(ReviewReason::GenericTerm);
    }

    None
}

/// Combine the rule's base confidence with extraction quality
pub fn resolve(
    rule: &CompiledRule,
    raw: &str,
    extractor: &Extractor,
    normalizer: &Normalizer,
    config: &AnalysisConfig,
) -> Resolution {
    let cleaned = normalizer.clean(raw);
    if raw.trim().is_empty() || cleaned.is_empty() {
        return Resolution {
            vendor_name: UNKNOWN_VENDOR.to_string(),
            confidence: EMPTY_EXTRACTION_CONFIDENCE,
            needs_manual_review: true,
            review_reason: Some(ReviewReason::EmptyExtraction),
        };
    }

    let canonical = canonical_vendor(&cleaned);
    let vendor_name = normalizer.display_name(raw);
    let base = rule.base_confidence();

    let (confidence, review_reason) =
        match extraction_quality(raw, canonical.is_some(), extractor) {
            Some(reason) => (base * config.degenerate_confidence_factor, Some(reason)),
            None if base < TRUSTED_BASE_CONFIDENCE => {
                (base, Some(ReviewReason::LowBaseConfidence))
            }
            None => (base, None),
        };

    Resolution {
        vendor_name,
        confidence: confidence.clamp(0.0, 1.0),
        needs_manual_review: review_reason.is_some(),
        review_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        extractor: Extractor,
        normalizer: Normalizer,
        config: AnalysisConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                extractor: Extractor::new().unwrap(),
                normalizer: Normalizer::new().unwrap(),
                config: AnalysisConfig::default(),
            }
        }

        fn resolve(&self, description: &str) -> Resolution {
            let rule = self.extractor.detect(description).unwrap();
            let raw = rule.extract(description, description);
            resolve(rule, &raw, &self.extractor, &self.normalizer, &self.config)
        }
    }

    #[test]
    fn test_trusted_extraction_keeps_base() {
        let f = Fixture::new();
        let r = f.resolve("PAYPAL *GRUBHUB");
        assert_eq!(r.vendor_name, "Grubhub");
        assert_eq!(r.confidence, 0.9);
        assert!(!r.needs_manual_review);
        assert_eq!(r.review_reason, None);
    }

    #[test]
    fn test_all_digit_extraction_is_penalized() {
        let f = Fixture::new();
        let r = f.resolve("SQ *8472639");
        assert!(r.needs_manual_review);
        assert_eq!(r.review_reason, Some(ReviewReason::AllDigits));
        assert!(r.confidence < 0.9);
        assert!((r.confidence - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_low_base_confidence_needs_review() {
        let f = Fixture::new();
        let r = f.resolve("APLPAY JOES DINER");
        assert_eq!(r.vendor_name, "Joes Diner");
        assert_eq!(r.confidence, 0.75);
        assert!(r.needs_manual_review);
        assert_eq!(r.review_reason, Some(ReviewReason::LowBaseConfidence));
    }

    #[test]
    fn test_empty_extraction() {
        let f = Fixture::new();
        let r = f.resolve("ZELLE INSTANT");
        assert_eq!(r.vendor_name, UNKNOWN_VENDOR);
        assert_eq!(r.confidence, EMPTY_EXTRACTION_CONFIDENCE);
        assert_eq!(r.review_reason, Some(ReviewReason::EmptyExtraction));
    }

    #[test]
    fn test_extraction_quality_rules() {
        let extractor = Extractor::new().unwrap();
        assert_eq!(
            extraction_quality("ABCD", false, &extractor),
            Some(ReviewReason::ShortCode)
        );
        assert_eq!(
            extraction_quality("AB", false, &extractor),
            Some(ReviewReason::TooShort)
        );
        assert_eq!(
            extraction_quality("Ab", false, &extractor),
            Some(ReviewReason::TooShort)
        );
        assert_eq!(
            extraction_quality("XKQ", false, &extractor),
            Some(ReviewReason::ShortCode)
        );
        assert_eq!(extraction_quality("EBAY", true, &extractor), None);
        assert_eq!(
            extraction_quality("# 1234-55", false, &extractor),
            Some(ReviewReason::AllDigits)
        );
        assert_eq!(
            extraction_quality("ONLINE PAYMENT", false, &extractor),
            Some(ReviewReason::GenericTerm)
        );
        assert_eq!(extraction_quality("Corner Bistro", false, &extractor), None);
    }
}
