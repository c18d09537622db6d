//! Transaction unmasking
//!
//! Recovers the real merchant behind a card description:
//! 1. Detect the payment processor (first signature match in table order)
//! 2. Extract the vendor text with that processor's strategy
//! 3. Normalize and resolve confidence
//! 4. Unmatched descriptions are either direct merchants or, when they look
//!    masked, go through fallback recovery
//!
//! Every path yields a result; only the confidence varies.

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::extract::Extractor;
use crate::models::{ReviewReason, Transaction, UnmaskResult};
use crate::normalize::Normalizer;
use crate::resolve::resolve;
use crate::rules::{category_hits, DIRECT, UNKNOWN_PROCESSOR, UNKNOWN_VENDOR};
use crate::suggest::{suggestions, Fallback, RECOVERED_CONFIDENCE};

/// Category reported when nothing identifies one
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Unmasking pipeline with all patterns compiled up front
#[derive(Debug, Clone)]
pub struct Unmasker {
    extractor: Extractor,
    normalizer: Normalizer,
    fallback: Fallback,
    config: AnalysisConfig,
}

impl Unmasker {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Ok(Self {
            extractor: Extractor::new()?,
            normalizer: Normalizer::new()?,
            fallback: Fallback::new()?,
            config,
        })
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Unmask one transaction using all of its descriptive fields
    pub fn unmask(&self, transaction: &Transaction) -> UnmaskResult {
        self.unmask_parts(
            &transaction.description,
            &transaction.context(),
            Some(transaction.amount),
            transaction.category.as_deref(),
        )
    }

    /// Unmask a bare description with no amount or extra context
    pub fn unmask_description(&self, description: &str) -> UnmaskResult {
        self.unmask_parts(description, description, None, None)
    }

    fn unmask_parts(
        &self,
        description: &str,
        context: &str,
        amount: Option<f64>,
        category: Option<&str>,
    ) -> UnmaskResult {
        let description = description.trim();

        if let Some(rule) = self.extractor.detect(description) {
            let raw = rule.extract(description, context);
            let resolution = resolve(
                rule,
                &raw,
                &self.extractor,
                &self.normalizer,
                &self.config,
            );
            let possible_vendors = if resolution.needs_manual_review {
                suggestions(context, amount, self.config.max_suggestions)
            } else {
                Vec::new()
            };

            return UnmaskResult {
                original_description: description.to_string(),
                matched_processor: rule.name().to_string(),
                inferred_category: infer_category(category, &resolution.vendor_name, context),
                extracted_vendor_name: resolution.vendor_name,
                confidence: resolution.confidence,
                is_obscured: true,
                needs_manual_review: resolution.needs_manual_review,
                review_reason: resolution.review_reason,
                possible_vendors,
            };
        }

        if self.extractor.is_suspicious(description) {
            let recovered = self
                .fallback
                .recover(context)
                .map(|raw| self.normalizer.display_name(&raw))
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_VENDOR.to_string());
            debug!("Recovered {:?} from masked descriptor {:?}", recovered, description);

            return UnmaskResult {
                original_description: description.to_string(),
                matched_processor: UNKNOWN_PROCESSOR.to_string(),
                inferred_category: infer_category(category, &recovered, context),
                extracted_vendor_name: recovered,
                confidence: RECOVERED_CONFIDENCE,
                is_obscured: true,
                needs_manual_review: true,
                review_reason: Some(ReviewReason::UnrecognizedDescriptor),
                possible_vendors: suggestions(context, amount, self.config.max_suggestions),
            };
        }

        let name = self.normalizer.display_name(description);
        let name = if name.is_empty() {
            UNKNOWN_VENDOR.to_string()
        } else {
            name
        };

        UnmaskResult {
            original_description: description.to_string(),
            matched_processor: DIRECT.to_string(),
            inferred_category: infer_category(category, &name, context),
            extracted_vendor_name: name,
            confidence: 1.0,
            is_obscured: false,
            needs_manual_review: false,
            review_reason: None,
            possible_vendors: Vec::new(),
        }
    }
}

/// Supplied category, else the first keyword category hit, else "Uncategorized"
fn infer_category(supplied: Option<&str>, vendor: &str, context: &str) -> String {
    if let Some(category) = supplied.map(str::trim).filter(|c| !c.is_empty()) {
        return category.to_string();
    }

    category_hits(&format!("{} {}", vendor, context))
        .first()
        .map(|c| c.to_string())
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::PROCESSOR_RULES;
    use chrono::NaiveDate;

    fn unmasker() -> Unmasker {
        Unmasker::new(AnalysisConfig::default()).unwrap()
    }

    fn tx(description: &str, amount: f64) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), description, amount)
    }

    #[test]
    fn test_paypal_grubhub() {
        let r = unmasker().unmask(&tx("PAYPAL *GRUBHUB", 23.40));
        assert_eq!(r.matched_processor, "PayPal");
        assert!(r.extracted_vendor_name.contains("Grubhub"));
        assert_eq!(r.confidence, 0.9);
        assert!(r.is_obscured);
        assert!(!r.needs_manual_review);
        assert!(r.possible_vendors.is_empty());
        assert_eq!(r.inferred_category, "Food & Dining");
    }

    #[test]
    fn test_square_digits_need_review() {
        let r = unmasker().unmask(&tx("SQ *8472639", 4.50));
        assert_eq!(r.matched_processor, "Square");
        assert!(r.needs_manual_review);
        assert!(r.confidence < 0.9);
        assert_eq!(r.review_reason, Some(ReviewReason::AllDigits));
        assert!(r
            .possible_vendors
            .contains(&"Possible food/coffee purchase".to_string()));
    }

    #[test]
    fn test_direct_strips_store_number() {
        let r = unmasker().unmask(&tx("STARBUCKS STORE #123", 6.25));
        assert_eq!(r.matched_processor, DIRECT);
        assert!(!r.is_obscured);
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.extracted_vendor_name, "Starbucks");
        assert!(!r.extracted_vendor_name.contains("123"));
    }

    #[test]
    fn test_unknown_descriptor_recovers_from_details() {
        let t = tx("ONLINE PAYMENT 99812", 42.00)
            .with_extended_details("Questions? support@brightlamp.com");
        let r = unmasker().unmask(&t);
        assert_eq!(r.matched_processor, UNKNOWN_PROCESSOR);
        assert_eq!(r.extracted_vendor_name, "Brightlamp");
        assert_eq!(r.confidence, RECOVERED_CONFIDENCE);
        assert!(r.needs_manual_review);
        assert!(r.is_obscured);
    }

    #[test]
    fn test_unknown_descriptor_without_clues() {
        let r = unmasker().unmask(&tx("48213377", 120.00));
        assert_eq!(r.matched_processor, UNKNOWN_PROCESSOR);
        assert_eq!(r.extracted_vendor_name, UNKNOWN_VENDOR);
        assert_eq!(r.confidence, RECOVERED_CONFIDENCE);
    }

    #[test]
    fn test_uppercase_descriptor_recovers_merchant() {
        let u = unmasker();

        let r = u.unmask_description("POS PURCHASE ACME HARDWARE 4471");
        assert_eq!(r.matched_processor, UNKNOWN_PROCESSOR);
        assert_eq!(r.extracted_vendor_name, "Acme Hardware");
        assert_eq!(r.review_reason, Some(ReviewReason::UnrecognizedDescriptor));

        let r = u.unmask_description("ONLINE PAYMENT BRIGHTLAMP LLC");
        assert_eq!(r.extracted_vendor_name, "Brightlamp");
    }

    #[test]
    fn test_supplied_category_wins() {
        let t = tx("PAYPAL *GRUBHUB", 20.0).with_category("Travel");
        assert_eq!(unmasker().unmask(&t).inferred_category, "Travel");
        assert_eq!(
            unmasker().unmask(&tx("ACME WIDGET WORKS", 20.0)).inferred_category,
            UNCATEGORIZED
        );
    }

    #[test]
    fn test_every_processor_is_obscured_and_bounded() {
        let samples = [
            "PAYPAL *ETSYSELLER",
            "SQ *CORNER CAFE",
            "STRIPE *NOTION LABS",
            "VENMO *JANE DOE",
            "CASH APP*JOHN SMITH",
            "ZELLE TO BOB SMITH",
            "TST* HARBOR GRILL",
            "CLV*0012 MAIN ST DELI",
            "APLPAY GREEN MARKET",
            "GOOGLE PAY NETFLIX",
        ];
        let u = unmasker();
        for sample in samples {
            let r = u.unmask_description(sample);
            assert!(r.is_obscured, "{} should be obscured", sample);
            assert!(
                PROCESSOR_RULES.iter().any(|p| p.name == r.matched_processor),
                "{} matched {}",
                sample,
                r.matched_processor
            );
            assert!((0.0..=1.0).contains(&r.confidence));
            assert!(r.possible_vendors.len() <= 5);
        }
    }
}
