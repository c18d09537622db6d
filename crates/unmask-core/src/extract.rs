//! Processor detection and vendor extraction
//!
//! Each row of [`PROCESSOR_RULES`] is compiled once into a [`CompiledRule`].
//! Detection walks the compiled rules in table order and stops at the first
//! signature match; extraction then applies that row's strategy.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::Result;
use crate::rules::{
    canonical_hits, ExtractionStrategy, ProcessorRule, GENERIC_WORD_PATTERN, PROCESSOR_RULES,
    SUSPICIOUS_DESCRIPTOR_PATTERNS,
};

/// A processor row with its patterns compiled
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: &'static ProcessorRule,
    signatures: Vec<Regex>,
    capture: Option<Regex>,
    cleanup: Vec<(Regex, &'static str)>,
}

impl CompiledRule {
    fn compile(rule: &'static ProcessorRule) -> Result<Self> {
        let signatures = rule
            .signatures
            .iter()
            .map(|p| case_insensitive(p))
            .collect::<Result<Vec<_>>>()?;

        let (capture, cleanup) = match rule.strategy {
            ExtractionStrategy::Delimiter { cleanup, .. } => (
                None,
                cleanup
                    .iter()
                    .map(|p| -> Result<(Regex, &'static str)> { Ok((Regex::new(p)?, "")) })
                    .collect::<Result<Vec<_>>>()?,
            ),
            ExtractionStrategy::Positional { cleanup, .. } => (
                None,
                cleanup
                    .iter()
                    .map(|(p, replacement)| -> Result<(Regex, &'static str)> {
                        Ok((case_insensitive(p)?, *replacement))
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            ExtractionStrategy::RegexCapture { pattern } => {
                (Some(case_insensitive(pattern)?), Vec::new())
            }
            ExtractionStrategy::KeywordLookup => (None, Vec::new()),
        };

        Ok(Self {
            rule,
            signatures,
            capture,
            cleanup,
        })
    }

    pub fn name(&self) -> &'static str {
        self.rule.name
    }

    pub fn base_confidence(&self) -> f64 {
        self.rule.base_confidence
    }

    pub fn matches(&self, description: &str) -> bool {
        self.signatures.iter().any(|re| re.is_match(description))
    }

    /// Raw vendor text for a description this rule matched, possibly empty
    pub fn extract(&self, description: &str, context: &str) -> String {
        let description = description.trim();
        let extracted = match self.rule.strategy {
            ExtractionStrategy::Delimiter { separator, .. } => {
                let token = description.split(separator).nth(1).unwrap_or("");
                self.apply_cleanup(token.trim())
            }
            ExtractionStrategy::Positional { drop_tokens, .. } => self
                .apply_cleanup(description)
                .split_whitespace()
                .skip(drop_tokens)
                .collect::<Vec<_>>()
                .join(" "),
            ExtractionStrategy::RegexCapture { .. } => self
                .capture
                .as_ref()
                .and_then(|re| re.captures(description))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            ExtractionStrategy::KeywordLookup => {
                // the processor's own name must not count as a vendor hit
                let mut stripped = context.to_string();
                for re in &self.signatures {
                    stripped = re.replace_all(&stripped, " ").to_string();
                }
                canonical_hits(&stripped)
                    .first()
                    .map(|canonical| canonical.to_string())
                    .unwrap_or_default()
            }
        };

        extracted.trim().to_string()
    }

    fn apply_cleanup(&self, text: &str) -> String {
        self.cleanup
            .iter()
            .fold(text.to_string(), |acc, (re, replacement)| {
                re.replace_all(&acc, *replacement).trim().to_string()
            })
    }
}

/// Processor detector over the full rule table
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: Vec<CompiledRule>,
    suspicious: Vec<Regex>,
    generic_word: Regex,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        let rules = PROCESSOR_RULES
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;

        let suspicious = SUSPICIOUS_DESCRIPTOR_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            suspicious,
            generic_word: Regex::new(GENERIC_WORD_PATTERN)?,
        })
    }

    /// First rule (in table order) whose signature matches
    pub fn detect(&self, description: &str) -> Option<&CompiledRule> {
        let description = description.trim();
        let found = self.rules.iter().find(|r| r.matches(description));
        if let Some(rule) = found {
            debug!("Matched processor {} for {:?}", rule.name(), description);
        }
        found
    }

    /// True when the text looks masked: bare number, short code, or a generic word
    pub fn is_suspicious(&self, text: &str) -> bool {
        let text = text.trim();
        self.suspicious.iter().any(|re| re.is_match(text))
    }

    /// True when the text contains a generic word such as "payment" or "transfer"
    pub fn has_generic_word(&self, text: &str) -> bool {
        self.generic_word.is_match(text)
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(description: &str) -> Option<(&'static str, String)> {
        let extractor = Extractor::new().unwrap();
        extractor
            .detect(description)
            .map(|rule| (rule.name(), rule.extract(description, description)))
    }

    #[test]
    fn test_delimiter_strategy() {
        assert_eq!(
            extract("PAYPAL *GRUBHUB"),
            Some(("PayPal", "GRUBHUB".to_string()))
        );
        assert_eq!(
            extract("PAYPAL *NETFLIX 4029357733"),
            Some(("PayPal", "NETFLIX".to_string()))
        );
        assert_eq!(
            extract("SQ *BLUE BOTTLE COFFEE CA"),
            Some(("Square", "BLUE BOTTLE COFFEE".to_string()))
        );
        assert_eq!(
            extract("SQ *8472639"),
            Some(("Square", "8472639".to_string()))
        );
        assert_eq!(
            extract("TST* CORNER BISTRO"),
            Some(("Toast", "CORNER BISTRO".to_string()))
        );
    }

    #[test]
    fn test_delimiter_without_token() {
        assert_eq!(extract("PAYPAL *"), Some(("PayPal", String::new())));
    }

    #[test]
    fn test_regex_capture_strategy() {
        assert_eq!(
            extract("VENMO PAYMENT TO JANE DOE"),
            Some(("Venmo", "JANE DOE".to_string()))
        );
        assert_eq!(
            extract("ZELLE PAYMENT TO BOB SMITH CONF# 88123"),
            Some(("Zelle", "BOB SMITH".to_string()))
        );
        assert_eq!(
            extract("SQC*JOHN APPLESEED"),
            Some(("CashApp", "JOHN APPLESEED".to_string()))
        );
        assert_eq!(extract("ZELLE INSTANT"), Some(("Zelle", String::new())));
    }

    #[test]
    fn test_positional_strategy() {
        assert_eq!(
            extract("CLV*0042 CORNER DELI"),
            Some(("Clover", "CORNER DELI".to_string()))
        );
        assert_eq!(
            extract("APPLE PAY STARBUCKS"),
            Some(("Apple Pay", "STARBUCKS".to_string()))
        );
        assert_eq!(
            extract("APLPAY JOES DINER"),
            Some(("Apple Pay", "JOES DINER".to_string()))
        );
    }

    #[test]
    fn test_keyword_lookup_ignores_processor_name() {
        let extractor = Extractor::new().unwrap();
        let rule = extractor.detect("GOOGLE PAY SPOTIFY P0C1").unwrap();
        assert_eq!(rule.name(), "Google Pay");
        assert_eq!(rule.extract("GOOGLE PAY SPOTIFY P0C1", "GOOGLE PAY SPOTIFY P0C1"), "Spotify");
        assert_eq!(rule.extract("GOOGLE PAY 1123", "GOOGLE PAY 1123"), "");
    }

    #[test]
    fn test_table_order_tie_break() {
        // Square's signature is checked before CashApp's
        assert_eq!(extract("SQ *SQC LAUNDRY").map(|(p, _)| p), Some("Square"));
        assert_eq!(extract("SQC*LAUNDRY").map(|(p, _)| p), Some("CashApp"));
    }

    #[test]
    fn test_no_match() {
        assert!(extract("STARBUCKS STORE #123").is_none());
        assert!(extract("WHOLE FOODS MARKET").is_none());
    }

    #[test]
    fn test_suspicious_descriptors() {
        let extractor = Extractor::new().unwrap();
        assert!(extractor.is_suspicious("48213377"));
        assert!(extractor.is_suspicious("XYZ"));
        assert!(extractor.is_suspicious("ONLINE PAYMENT 4821"));
        assert!(extractor.is_suspicious("Transfer to savings"));
        assert!(!extractor.is_suspicious("STARBUCKS STORE #123"));
        assert!(!extractor.is_suspicious("Whole Foods Market"));
        assert!(extractor.has_generic_word("pos debit"));
        assert!(!extractor.has_generic_word("XYZ"));
    }
}
