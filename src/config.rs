//! Analyzer configuration
//!
//! Every detection threshold is an explicit, named field with a documented
//! default. Nothing is read from ambient state; callers construct a config
//! (or take [`AnalyzerConfig::default`]) and pass it to the analyzer.

use serde::{Deserialize, Serialize};

use crate::{AnalysisError, Period, Ratio, Result};

/// Detection thresholds and ingestion behavior.
///
/// | Field | Default | Meaning |
/// |---|---|---|
/// | `doji_max_body_ratio` | 0.1 | max body/range for a Doji |
/// | `shadow_body_ratio` | 2.0 | min dominant-shadow/body multiple for Hammer and Shooting Star |
/// | `trend_window` | 3 | preceding closes averaged for the local-trend gate |
/// | `body_avg_window` | 10 | preceding bodies averaged for large/small body sizing |
/// | `large_body_factor` | 1.0 | body > trailing avg × factor counts as large |
/// | `small_body_factor` | 1.0 | body < trailing avg × factor counts as small |
/// | `permissive` | false | skip invalid rows at ingestion instead of failing |
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub doji_max_body_ratio: Ratio,
    pub shadow_body_ratio: f64,
    pub trend_window: Period,
    pub body_avg_window: Period,
    pub large_body_factor: f64,
    pub small_body_factor: f64,
    pub permissive: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            doji_max_body_ratio: Ratio::new_const(0.1),
            shadow_body_ratio: 2.0,
            trend_window: Period::new_const(3),
            body_avg_window: Period::new_const(10),
            large_body_factor: 1.0,
            small_body_factor: 1.0,
            permissive: false,
        }
    }
}

impl AnalyzerConfig {
    /// Reject non-finite or non-positive threshold values.
    ///
    /// `Ratio` and `Period` fields are validated by construction; only the
    /// open-ended f64 factors need a range check here.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("shadow_body_ratio", self.shadow_body_ratio),
            ("large_body_factor", self.large_body_factor),
            ("small_body_factor", self.small_body_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{field} must be a positive finite number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalyzerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_factors() {
        let mut config = AnalyzerConfig::default();
        config.shadow_body_ratio = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.large_body_factor = -1.0;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.small_body_factor = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{"doji_max_body_ratio":0.05,"trend_window":5}"#).unwrap();
        assert!((config.doji_max_body_ratio.get() - 0.05).abs() < f64::EPSILON);
        assert_eq!(config.trend_window.get(), 5);
        assert!((config.shadow_body_ratio - 2.0).abs() < f64::EPSILON);
        assert!(!config.permissive);
    }

    #[test]
    fn test_deserialize_rejects_out_of_range_ratio() {
        let result = serde_json::from_str::<AnalyzerConfig>(r#"{"doji_max_body_ratio":1.5}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<AnalyzerConfig>(r#"{"trend_window":0}"#);
        assert!(result.is_err());
    }
}
