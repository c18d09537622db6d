//! Vendor name normalization
//!
//! Turns a candidate vendor string ("STARBUCKS STORE #123", "ACME, INC. 4411")
//! into a display name and a canonical key used to merge description variants.

use regex::Regex;

use crate::error::Result;
use crate::rules::{canonical_vendor, UNKNOWN_VENDOR};

/// Compiled normalization patterns
#[derive(Debug, Clone)]
pub struct Normalizer {
    dates: Regex,
    store_numbers: Regex,
    punctuation: Regex,
    trailing_ids: Regex,
    legal_suffixes: Regex,
    web_suffix: Regex,
    whitespace: Regex,
}

impl Normalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dates: Regex::new(r"\b\d{1,2}[/-]\d{1,2}(?:[/-]\d{2,4})?\b")?,
            store_numbers: Regex::new(
                r"\b(?:store|str|shop|loc|location|unit)?\s*#\s*\d+\b|\bstore\s+\d+\b",
            )?,
            punctuation: Regex::new(r"[^a-z0-9&'.\s]")?,
            trailing_ids: Regex::new(r"(?:\s+[a-z]{0,3}\d[\d-]*)+\s*$")?,
            legal_suffixes: Regex::new(
                r"(?:[\s,]+(?:inc|llc|ltd|corp|corporation|co|company|plc|gmbh|limited)\.?)+\s*$",
            )?,
            web_suffix: Regex::new(r"\.(?:com|net|org|io)$")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Lowercase text with dates, store numbers, trailing ids and legal suffixes removed
    pub fn clean(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        let without_dates = self.dates.replace_all(&lower, " ");
        let without_stores = self.store_numbers.replace_all(&without_dates, " ");
        let without_punct = self.punctuation.replace_all(&without_stores, " ");
        let mut cleaned = self
            .whitespace
            .replace_all(&without_punct, " ")
            .trim()
            .to_string();

        // "acme inc 4411" needs the id stripped before the suffix is visible
        loop {
            let before = cleaned.clone();
            cleaned = self.trailing_ids.replace(&cleaned, "").to_string();
            cleaned = self.legal_suffixes.replace(&cleaned, "").to_string();
            cleaned = self.web_suffix.replace(&cleaned, "").to_string();
            cleaned = cleaned.trim().trim_end_matches(['.', ',', '&']).trim().to_string();
            if cleaned == before {
                break;
            }
        }

        cleaned
    }

    /// Display name: canonical vendor when the cleaned text matches one, else title case
    pub fn display_name(&self, text: &str) -> String {
        let cleaned = self.clean(text);
        match canonical_vendor(&cleaned) {
            Some(canonical) => canonical.to_string(),
            None => title_case(&cleaned),
        }
    }

    /// Identity used to merge variants of one vendor into a single profile.
    ///
    /// Canonical vendors key on their canonical name; everything else keys on
    /// the leading one or two non-numeric tokens.
    pub fn canonical_key(&self, name: &str) -> String {
        let cleaned = self.clean(name);
        if let Some(canonical) = canonical_vendor(&cleaned) {
            return canonical.to_lowercase();
        }

        let key = cleaned
            .split_whitespace()
            .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
            .take(2)
            .collect::<Vec<_>>()
            .join(" ");

        if key.is_empty() {
            UNKNOWN_VENDOR.to_lowercase()
        } else {
            key
        }
    }
}

/// Uppercase the first letter of every word, lowercase the rest
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new().unwrap()
    }

    #[test]
    fn test_clean_store_numbers() {
        let n = normalizer();
        assert_eq!(n.clean("STARBUCKS STORE #123"), "starbucks");
        assert_eq!(n.clean("TARGET #0042 SEATTLE"), "target seattle");
        assert_eq!(n.clean("SHELL STORE 5521"), "shell");
    }

    #[test]
    fn test_clean_trailing_ids_and_suffixes() {
        let n = normalizer();
        assert_eq!(n.clean("ACME, INC. 4411"), "acme");
        assert_eq!(n.clean("Widget Co LLC"), "widget");
        assert_eq!(n.clean("NETFLIX.COM"), "netflix");
        assert_eq!(n.clean("JOES PIZZA 12/01"), "joes pizza");
        assert_eq!(n.clean("BLUE BOTTLE   COFFEE*8812"), "blue bottle coffee");
    }

    #[test]
    fn test_clean_keeps_all_digit_names() {
        let n = normalizer();
        assert_eq!(n.clean("8472639"), "8472639");
    }

    #[test]
    fn test_display_name() {
        let n = normalizer();
        assert_eq!(n.display_name("GRUBHUB"), "Grubhub");
        assert_eq!(n.display_name("STARBUCKS STORE #123"), "Starbucks");
        assert_eq!(n.display_name("JOES PIZZA"), "Joes Pizza");
    }

    #[test]
    fn test_canonical_key() {
        let n = normalizer();
        assert_eq!(n.canonical_key("NETFLIX.COM"), "netflix");
        assert_eq!(n.canonical_key("Uber Eats"), "uber eats");
        assert_eq!(n.canonical_key("JOES BBQ SHACK 0012"), "joes bbq");
        assert_eq!(n.canonical_key("Blue Bottle Coffee"), "blue bottle");
        assert_eq!(n.canonical_key("#123"), "unknown vendor");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("joes   bbq shack"), "Joes Bbq Shack");
        assert_eq!(title_case(""), "");
    }
}
