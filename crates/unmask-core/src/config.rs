//! Analysis configuration
//!
//! Thresholds that tune unmasking, reporting and the analyzers. The rule
//! tables themselves live in [`crate::rules`]; only numeric knobs are here.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for an explicit path, else the override in the data dir
//!    (~/.local/share/unmask/analysis.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/analysis.toml");

/// Upper bound for `unmask.max_suggestions`
pub const MAX_SUGGESTIONS: usize = 5;

/// Upper bound for `report.review_cap`
pub const MAX_REVIEW_CAP: usize = 50;

/// Upper bound for `report.cluster_examples`
pub const MAX_CLUSTER_EXAMPLES: usize = 3;

/// Tunable thresholds for one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Obscured results above this confidence name the vendor during aggregation
    pub obscured_confidence_threshold: f64,
    /// Multiplier on base confidence for degenerate extractions
    pub degenerate_confidence_factor: f64,
    /// Cap on suggestions per unmask result
    pub max_suggestions: usize,
    /// Cap on review items in the summary
    pub review_cap: usize,
    /// Example descriptions per suspicious cluster
    pub cluster_examples: usize,
    /// Bucket confidence needed to record a recurrence pattern
    pub recurrence_min_confidence: f64,
    /// Pattern confidence needed for the recurrence subscription signal
    pub subscription_min_confidence: f64,
    /// Total that multiple same-day charges must exceed
    pub same_day_threshold: f64,
    /// Uncapped fraud score above which a vendor is fraudulent
    pub fraud_threshold: f64,
    /// Anomaly score above which `anomaly_detected` is tagged
    pub anomaly_tag_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            obscured_confidence_threshold: 0.5,
            degenerate_confidence_factor: 0.5,
            max_suggestions: MAX_SUGGESTIONS,
            review_cap: MAX_REVIEW_CAP,
            cluster_examples: MAX_CLUSTER_EXAMPLES,
            recurrence_min_confidence: 0.7,
            subscription_min_confidence: 0.8,
            same_day_threshold: 500.0,
            fraud_threshold: 50.0,
            anomaly_tag_threshold: 0.5,
        }
    }
}

impl AnalysisConfig {
    /// Load config, preferring `path`, then the data-dir override, then the embedded default
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(default_path) => match fs::read_to_string(&default_path) {
                    Ok(content) => {
                        debug!("Using config override at {}", default_path.display());
                        content
                    }
                    Err(e) => {
                        warn!(
                            "Ignoring unreadable config {}: {}",
                            default_path.display(),
                            e
                        );
                        DEFAULT_CONFIG.to_string()
                    }
                },
                None => DEFAULT_CONFIG.to_string(),
            },
        };

        parse_config(&content)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("unmask").join("analysis.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    unmask: Option<RawUnmask>,
    report: Option<RawReport>,
    recurrence: Option<RawThreshold>,
    subscription: Option<RawThreshold>,
    fraud: Option<RawFraud>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUnmask {
    obscured_confidence_threshold: Option<f64>,
    degenerate_confidence_factor: Option<f64>,
    max_suggestions: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReport {
    review_cap: Option<usize>,
    cluster_examples: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThreshold {
    min_confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFraud {
    same_day_threshold: Option<f64>,
    fraud_threshold: Option<f64>,
    anomaly_tag_threshold: Option<f64>,
}

/// Parse config from TOML content, applying it over the defaults
pub fn parse_config(content: &str) -> Result<AnalysisConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AnalysisConfig::default();

    if let Some(unmask) = raw.unmask {
        if let Some(v) = unmask.obscured_confidence_threshold {
            config.obscured_confidence_threshold = unit_interval("obscured_confidence_threshold", v)?;
        }
        if let Some(v) = unmask.degenerate_confidence_factor {
            config.degenerate_confidence_factor = unit_interval("degenerate_confidence_factor", v)?;
        }
        if let Some(v) = unmask.max_suggestions {
            config.max_suggestions = at_most("max_suggestions", v, MAX_SUGGESTIONS)?;
        }
    }

    if let Some(report) = raw.report {
        if let Some(v) = report.review_cap {
            config.review_cap = at_most("review_cap", v, MAX_REVIEW_CAP)?;
        }
        if let Some(v) = report.cluster_examples {
            config.cluster_examples = at_most("cluster_examples", v, MAX_CLUSTER_EXAMPLES)?;
        }
    }

    if let Some(v) = raw.recurrence.and_then(|r| r.min_confidence) {
        config.recurrence_min_confidence = unit_interval("recurrence.min_confidence", v)?;
    }

    if let Some(v) = raw.subscription.and_then(|s| s.min_confidence) {
        config.subscription_min_confidence = unit_interval("subscription.min_confidence", v)?;
    }

    if let Some(fraud) = raw.fraud {
        if let Some(v) = fraud.same_day_threshold {
            if v < 0.0 {
                return Err(Error::Config(format!(
                    "same_day_threshold must be non-negative, got {}",
                    v
                )));
            }
            config.same_day_threshold = v;
        }
        if let Some(v) = fraud.fraud_threshold {
            config.fraud_threshold = v;
        }
        if let Some(v) = fraud.anomaly_tag_threshold {
            config.anomaly_tag_threshold = unit_interval("anomaly_tag_threshold", v)?;
        }
    }

    Ok(config)
}

fn unit_interval(name: &str, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(Error::Config(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

fn at_most(name: &str, value: usize, max: usize) -> Result<usize> {
    if value <= max {
        Ok(value)
    } else {
        Err(Error::Config(format!(
            "{} must be at most {}, got {}",
            name, max, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = parse_config(
            r#"
[fraud]
same_day_threshold = 250.0
"#,
        )
        .unwrap();

        assert_eq!(config.same_day_threshold, 250.0);
        assert_eq!(config.review_cap, 50);
        assert_eq!(config.recurrence_min_confidence, 0.7);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = parse_config("[recurrence]\nmin_confidence = 1.5\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_section() {
        assert!(parse_config("[network]\nport = 1\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_key_in_section() {
        let err = parse_config("[fraud]\nsame_day_treshold = 100.0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(parse_config("[report]\nreview_limit = 5\n").is_err());
        assert!(parse_config("[recurrence]\nmin_confidance = 0.5\n").is_err());
    }

    #[test]
    fn test_rejects_caps_above_limits() {
        for content in [
            "[unmask]\nmax_suggestions = 9\n",
            "[report]\nreview_cap = 51\n",
            "[report]\ncluster_examples = 4\n",
        ] {
            let err = parse_config(content).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{}", content);
        }

        let config = parse_config("[unmask]\nmax_suggestions = 2\n[report]\ncluster_examples = 3\n")
            .unwrap();
        assert_eq!(config.max_suggestions, 2);
        assert_eq!(config.cluster_examples, MAX_CLUSTER_EXAMPLES);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        fs::write(&path, "[report]\nreview_cap = 10\n").unwrap();

        let config = AnalysisConfig::load(Some(&path)).unwrap();
        assert_eq!(config.review_cap, 10);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = AnalysisConfig::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
