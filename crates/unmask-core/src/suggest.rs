//! Fallback vendor recovery and review suggestions
//!
//! Recovery runs for masked descriptions no processor recognizes. Suggestions
//! are attached to every result that needs manual review.

use regex::Regex;

use crate::error::Result;
use crate::rules::{
    canonical_hits, category_hits, is_generic_term, GENERIC_TERMS, GENERIC_WORD_PATTERN,
};

/// Confidence of anything recovered by the fallback path
pub const RECOVERED_CONFIDENCE: f64 = 0.3;

/// Band of ".99" prices that look like plan pricing
const SUBSCRIPTION_PRICE_BAND: std::ops::RangeInclusive<f64> = 4.99..=29.99;

/// Charges below this read as food or coffee
const SMALL_PURCHASE_LIMIT: f64 = 10.0;

/// Compiled recovery patterns
#[derive(Debug, Clone)]
pub struct Fallback {
    email: Regex,
    url: Regex,
    capitalized: Regex,
    generic_word: Regex,
    generic_terms: Regex,
}

impl Fallback {
    pub fn new() -> Result<Self> {
        Ok(Self {
            email: Regex::new(r"[A-Za-z0-9._%+-]+@([A-Za-z0-9-]+)(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}")?,
            url: Regex::new(
                r"(?i)\b(?:https?://)?(?:www\.)?([a-z0-9][a-z0-9-]*)\.(?:com|net|org|io|co|app|shop|store)\b",
            )?,
            capitalized: Regex::new(r"\b[A-Z][A-Za-z'&]+(?:[ \t]+[A-Z][A-Za-z'&]+)*")?,
            generic_word: Regex::new(GENERIC_WORD_PATTERN)?,
            generic_terms: generic_terms_regex()?,
        })
    }

    /// Best-effort vendor text from the full context.
    ///
    /// Tries an email domain, then a URL host, then the first run of
    /// capitalized or all-caps words. Generic vocabulary is blanked out first
    /// and digits break a run, so trailing ids never join the name.
    pub fn recover(&self, context: &str) -> Option<String> {
        if let Some(label) = self
            .email
            .captures(context)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
        {
            return Some(label);
        }

        if let Some(label) = self
            .url
            .captures(context)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
        {
            return Some(label);
        }

        let stripped = self.generic_word.replace_all(context, " ");
        let stripped = self.generic_terms.replace_all(&stripped, " ");

        self.capitalized
            .find_iter(&stripped)
            .map(|m| m.as_str().trim())
            .find(|run| !is_generic_term(run))
            .map(str::to_string)
    }
}

/// Case-insensitive alternation over the generic terms, longest first
fn generic_terms_regex() -> Result<Regex> {
    let mut terms: Vec<&str> = GENERIC_TERMS.to_vec();
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let alternation = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))?)
}

/// Ordered, deduplicated vendor suggestions for a result needing review
pub fn suggestions(context: &str, amount: Option<f64>, max: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |s: String| {
        if !out.contains(&s) {
            out.push(s);
        }
    };

    for vendor in canonical_hits(context) {
        push(vendor.to_string());
    }

    for category in category_hits(context) {
        push(format!("Likely {} vendor", category));
    }

    if let Some(amount) = amount {
        let cents = (amount * 100.0).round() as i64 % 100;
        if cents == 99 && SUBSCRIPTION_PRICE_BAND.contains(&amount) {
            push("Possible subscription service".to_string());
        }
        if amount > 0.0 && amount < SMALL_PURCHASE_LIMIT {
            push("Possible food/coffee purchase".to_string());
        }
    }

    out.truncate(max);
    out
}
