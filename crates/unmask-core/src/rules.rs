//! Static rule tables
//!
//! Processor signatures, keyword lists and the canonical vendor map. These are
//! configuration data evaluated in table order: the first matching entry wins,
//! so ordering is the tie-break everywhere in this module.

/// How a processor's description is turned into a vendor name
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtractionStrategy {
    /// Split once on `separator`, keep what follows, then strip `cleanup` patterns
    Delimiter {
        separator: char,
        cleanup: &'static [&'static str],
    },
    /// Apply `cleanup` (pattern, replacement) pairs, then drop leading tokens
    Positional {
        cleanup: &'static [(&'static str, &'static str)],
        drop_tokens: usize,
    },
    /// First capture group of `pattern`
    RegexCapture { pattern: &'static str },
    /// First vendor keyword found anywhere in the transaction context
    KeywordLookup,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delimiter { .. } => "delimiter",
            Self::Positional { .. } => "positional",
            Self::RegexCapture { .. } => "regex",
            Self::KeywordLookup => "keyword",
        }
    }
}

/// One row of the processor table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorRule {
    pub name: &'static str,
    /// Case-insensitive signature regexes; any match selects this processor
    pub signatures: &'static [&'static str],
    pub strategy: ExtractionStrategy,
    pub base_confidence: f64,
}

/// Trailing noise left behind the vendor token by delimiter processors
const DELIMITER_CLEANUP: &[&str] = &[
    // phone numbers: 4029357733, 402-935-7733, 800.555.1212
    r"\s+\+?\d{3}[-. ]?\d{3}[-. ]?\d{4}\s*$",
    // two-letter state code at the end
    r"\s+[A-Z]{2}\s*$",
];

pub const PROCESSOR_RULES: &[ProcessorRule] = &[
    ProcessorRule {
        name: "PayPal",
        signatures: &[r"^PAYPAL\s*\*", r"^PP\s*\*"],
        strategy: ExtractionStrategy::Delimiter {
            separator: '*',
            cleanup: DELIMITER_CLEANUP,
        },
        base_confidence: 0.9,
    },
    ProcessorRule {
        name: "Square",
        signatures: &[r"^SQ\s*\*", r"^SQUARE\s*\*"],
        strategy: ExtractionStrategy::Delimiter {
            separator: '*',
            cleanup: DELIMITER_CLEANUP,
        },
        base_confidence: 0.9,
    },
    ProcessorRule {
        name: "Stripe",
        signatures: &[r"^STRIPE\s*\*", r"^ST\s*\*"],
        strategy: ExtractionStrategy::Delimiter {
            separator: '*',
            cleanup: DELIMITER_CLEANUP,
        },
        base_confidence: 0.85,
    },
    ProcessorRule {
        name: "Venmo",
        signatures: &[r"^VENMO\b"],
        strategy: ExtractionStrategy::RegexCapture {
            pattern: r"VENMO\s*\*?\s*(?:PAYMENT\s+(?:TO|FROM)\s+)?(.+)",
        },
        base_confidence: 0.8,
    },
    ProcessorRule {
        name: "CashApp",
        signatures: &[r"^CASH\s*APP\b", r"^SQC\s*\*"],
        strategy: ExtractionStrategy::RegexCapture {
            pattern: r"(?:CASH\s*APP|SQC)\s*\*?\s*(.+)",
        },
        base_confidence: 0.85,
    },
    ProcessorRule {
        name: "Zelle",
        signatures: &[r"\bZELLE\b"],
        strategy: ExtractionStrategy::RegexCapture {
            pattern: r"ZELLE\s+(?:PAYMENT\s+)?(?:TO|FROM)\s+(.+?)(?:\s+CONF.*)?$",
        },
        base_confidence: 0.8,
    },
    ProcessorRule {
        name: "Toast",
        signatures: &[r"^TST\s*\*"],
        strategy: ExtractionStrategy::Delimiter {
            separator: '*',
            cleanup: DELIMITER_CLEANUP,
        },
        base_confidence: 0.9,
    },
    ProcessorRule {
        name: "Clover",
        signatures: &[r"^(CLV|CLOVER)\s*\*"],
        strategy: ExtractionStrategy::Positional {
            cleanup: &[(r"^(CLV|CLOVER)\s*\*\s*", "")],
            drop_tokens: 1,
        },
        base_confidence: 0.85,
    },
    ProcessorRule {
        name: "Apple Pay",
        signatures: &[r"^(APLPAY|APPLE\s*PAY)\b"],
        strategy: ExtractionStrategy::Positional {
            cleanup: &[(r"^APPLE\s*PAY", "APLPAY")],
            drop_tokens: 1,
        },
        base_confidence: 0.75,
    },
    ProcessorRule {
        name: "Google Pay",
        signatures: &[r"^(GOOGLE\s*PAY|GPAY)\b"],
        strategy: ExtractionStrategy::KeywordLookup,
        base_confidence: 0.8,
    },
];

/// Lowercase keyword to canonical vendor name.
///
/// Longer keys precede their prefixes ("uber eats" before "uber").
pub const CANONICAL_VENDORS: &[(&str, &str)] = &[
    ("grubhub", "Grubhub"),
    ("doordash", "DoorDash"),
    ("uber eats", "Uber Eats"),
    ("ubereats", "Uber Eats"),
    ("uber", "Uber"),
    ("lyft", "Lyft"),
    ("instacart", "Instacart"),
    ("starbucks", "Starbucks"),
    ("mcdonalds", "McDonald's"),
    ("mcdonald's", "McDonald's"),
    ("chipotle", "Chipotle"),
    ("netflix", "Netflix"),
    ("spotify", "Spotify"),
    ("hulu", "Hulu"),
    ("disney plus", "Disney+"),
    ("disneyplus", "Disney+"),
    ("youtube", "YouTube"),
    ("patreon", "Patreon"),
    ("peloton", "Peloton"),
    ("amazon", "Amazon"),
    ("amzn", "Amazon"),
    ("apple.com", "Apple"),
    ("itunes", "Apple"),
    ("microsoft", "Microsoft"),
    ("adobe", "Adobe"),
    ("dropbox", "Dropbox"),
    ("github", "GitHub"),
    ("openai", "OpenAI"),
    ("shopify", "Shopify"),
    ("etsy", "Etsy"),
    ("ebay", "eBay"),
    ("walmart", "Walmart"),
    ("target", "Target"),
    ("costco", "Costco"),
    ("airbnb", "Airbnb"),
];

/// Category name to lowercase keywords, in priority order
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Food & Dining",
        &[
            "grubhub", "doordash", "uber eats", "ubereats", "starbucks", "coffee", "cafe",
            "pizza", "restaurant", "diner", "deli", "grill", "burger", "taco", "bakery",
            "mcdonald", "chipotle", "bbq",
        ],
    ),
    (
        "Groceries",
        &["grocery", "market", "instacart", "costco", "whole foods", "safeway", "kroger"],
    ),
    (
        "Entertainment",
        &["netflix", "hulu", "spotify", "disney", "youtube", "cinema", "theater", "tickets"],
    ),
    (
        "Software & Services",
        &["github", "adobe", "microsoft", "dropbox", "openai", "shopify", "icloud", "apple.com"],
    ),
    (
        "Shopping",
        &["amazon", "amzn", "walmart", "target", "etsy", "ebay", "boutique", "outlet"],
    ),
    (
        "Transportation",
        &["uber", "lyft", "taxi", "parking", "fuel", "shell", "chevron", "transit"],
    ),
    (
        "Health & Fitness",
        &["pharmacy", "cvs", "walgreens", "gym", "fitness", "peloton", "clinic"],
    ),
    ("Travel", &["airbnb", "hotel", "airline", "expedia", "booking.com"]),
];

/// Lowercase words that mark a vendor as a subscription on their own
pub const SUBSCRIPTION_KEYWORDS: &[&str] = &[
    "subscription",
    "membership",
    "monthly",
    "premium",
    "renewal",
    "recurring",
    "netflix",
    "spotify",
    "hulu",
    "disney",
    "youtube premium",
    "icloud",
    "patreon",
    "prime",
    "adobe",
    "dropbox",
    "github",
    "peloton",
];

/// Whole-word generic transaction vocabulary
pub const GENERIC_WORD_PATTERN: &str = r"(?i)\b(PAYMENT|TRANSFER|PURCHASE|DEBIT|POS)\b";

/// Descriptions that look masked even though no processor matched
pub const SUSPICIOUS_DESCRIPTOR_PATTERNS: &[&str] =
    &[r"^\d+$", r"^[A-Z]{2,4}$", GENERIC_WORD_PATTERN];

/// Lowercase terms that carry no vendor identity by themselves
pub const GENERIC_TERMS: &[&str] = &[
    "payment",
    "transfer",
    "purchase",
    "debit",
    "pos",
    "online",
    "unknown",
    "unknown vendor",
];

/// Amounts that show up disproportionately in card testing and scams
pub const SUSPICIOUS_AMOUNTS: &[f64] = &[0.01, 1.00, 99.99, 999.00, 999.99];

/// Lowercase keywords that add fraud risk when present in a vendor name
pub const BLACKLIST_KEYWORDS: &[&str] = &[
    "crypto",
    "bitcoin",
    "gift card",
    "giftcard",
    "wire transfer",
    "western union",
    "moneygram",
    "casino",
    "lottery",
    "sweepstakes",
];

/// Case-insensitive patterns of known scam merchant names
pub const SCAM_PATTERNS: &[&str] = &[
    r"(?i)\b(prize|winner|reward)s?\s+(center|claim|dept|department)\b",
    r"(?i)\btech(nical)?\s*support\b",
    r"(?i)\birs\b.*\b(payment|agent|refund)\b",
    r"(?i)\bverify\s*(your\s*)?account\b",
    r"(?i)\b(refund|recovery)\s*(center|services?)\b",
];

/// Name used whenever no vendor can be recovered
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

/// Processor label for descriptions that name the merchant directly
pub const DIRECT: &str = "Direct";

/// Processor label for masked descriptions no rule recognizes
pub const UNKNOWN_PROCESSOR: &str = "Unknown";

/// Canonical vendor for already-normalized lowercase text.
///
/// Matches in either direction: the text contains a key, or (for texts of at
/// least four characters) a key contains the text.
pub fn canonical_vendor(normalized: &str) -> Option<&'static str> {
    let text = normalized.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    CANONICAL_VENDORS
        .iter()
        .find(|(key, _)| text.contains(key) || (text.len() >= 4 && key.contains(text.as_str())))
        .map(|(_, canonical)| *canonical)
}

/// Canonical vendors whose keyword appears anywhere in `context`, in table order
pub fn canonical_hits(context: &str) -> Vec<&'static str> {
    let lower = context.to_lowercase();
    let mut hits: Vec<&'static str> = Vec::new();
    for (key, canonical) in CANONICAL_VENDORS {
        if lower.contains(key) && !hits.contains(canonical) {
            hits.push(canonical);
        }
    }
    hits
}

/// Categories whose keyword list hits `text`, in table order
pub fn category_hits(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .collect()
}

/// True when `text` names one of the subscription keywords
pub fn has_subscription_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    SUBSCRIPTION_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// True when `name` is nothing but a generic term
pub fn is_generic_term(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    GENERIC_TERMS.iter().any(|t| *t == lower)
}
