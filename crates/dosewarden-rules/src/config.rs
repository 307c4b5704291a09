//! TOML configuration for the standard rule set.
//!
//! ```toml
//! [engine]
//! assessed_by = "dosewarden"
//! parallel_modules = false
//! disabled_modules = ["duration"]
//!
//! [thresholds]
//! weight_based_tolerance = 0.20
//! fixed_dose_tolerance = 0.10
//! ```
//!
//! Every field is optional; an empty document yields the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use dosewarden_contracts::error::{DoseError, DoseResult};
use dosewarden_core::EngineSettings;

/// Numeric limits shared by the rule modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Relative band around a weight-based expected dose.
    pub weight_based_tolerance: f64,
    /// Relative band around a fixed adult dose.
    pub fixed_dose_tolerance: f64,
    /// Relative band around an indication-specific dose.
    pub indication_tolerance: f64,
    /// Days past the guideline maximum before a course is called excessive.
    pub duration_grace_days: f64,
    /// BMI at or above which the drug's obesity dosing weight applies.
    pub obesity_bmi: f64,
    /// Fraction of excess weight added to IBW for adjusted body weight.
    pub adjusted_weight_factor: f64,
    /// Hours an interval may fall short of a table interval without a flag.
    pub interval_slack_hours: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            weight_based_tolerance: 0.20,
            fixed_dose_tolerance: 0.10,
            indication_tolerance: 0.10,
            duration_grace_days: 3.0,
            obesity_bmi: 30.0,
            adjusted_weight_factor: 0.4,
            interval_slack_hours: 1.0,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoseCheckConfig {
    pub engine: EngineSettings,
    pub thresholds: RuleThresholds,
}

impl DoseCheckConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `DoseError::ConfigError` if the TOML is malformed or a field
    /// has the wrong type.
    pub fn from_toml_str(s: &str) -> DoseResult<Self> {
        let config: DoseCheckConfig = toml::from_str(s).map_err(|e| DoseError::ConfigError {
            reason: format!("failed to parse dose-check TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML.
    pub fn from_file(path: &Path) -> DoseResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| DoseError::ConfigError {
            reason: format!("failed to read dose-check config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> DoseResult<()> {
        let t = &self.thresholds;
        let fractions = [
            ("weight_based_tolerance", t.weight_based_tolerance),
            ("fixed_dose_tolerance", t.fixed_dose_tolerance),
            ("indication_tolerance", t.indication_tolerance),
            ("adjusted_weight_factor", t.adjusted_weight_factor),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(DoseError::ConfigError {
                    reason: format!("thresholds.{} must be between 0 and 1, got {}", name, value),
                });
            }
        }
        let non_negative = [
            ("duration_grace_days", t.duration_grace_days),
            ("obesity_bmi", t.obesity_bmi),
            ("interval_slack_hours", t.interval_slack_hours),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(DoseError::ConfigError {
                    reason: format!("thresholds.{} must not be negative, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use dosewarden_core::ModuleKind;

    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = DoseCheckConfig::from_toml_str("").unwrap();
        assert_eq!(config, DoseCheckConfig::default());
        assert_eq!(config.thresholds.weight_based_tolerance, 0.20);
        assert_eq!(config.thresholds.duration_grace_days, 3.0);
        assert!(!config.engine.parallel_modules);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = DoseCheckConfig::from_toml_str(
            r#"
            [engine]
            assessed_by = "night-pharmacist"
            disabled_modules = ["duration", "extended_infusion"]

            [thresholds]
            fixed_dose_tolerance = 0.05
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.assessed_by, "night-pharmacist");
        assert_eq!(
            config.engine.disabled_modules,
            vec![ModuleKind::Duration, ModuleKind::ExtendedInfusion]
        );
        assert_eq!(config.thresholds.fixed_dose_tolerance, 0.05);
        assert_eq!(config.thresholds.weight_based_tolerance, 0.20);
    }

    #[test]
    fn test_malformed_toml_is_a_config_error() {
        let err = DoseCheckConfig::from_toml_str("[engine\nparallel_modules = yes").unwrap_err();
        assert!(matches!(err, DoseError::ConfigError { .. }));
    }

    #[test]
    fn test_out_of_range_tolerance_is_rejected() {
        let err = DoseCheckConfig::from_toml_str("[thresholds]\nweight_based_tolerance = 2.5").unwrap_err();
        match err {
            DoseError::ConfigError { reason } => assert!(reason.contains("weight_based_tolerance")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nparallel_modules = true").unwrap();
        let config = DoseCheckConfig::from_file(file.path()).unwrap();
        assert!(config.engine.parallel_modules);
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let err = DoseCheckConfig::from_file(Path::new("/nonexistent/dosewarden.toml")).unwrap_err();
        assert!(matches!(err, DoseError::ConfigError { .. }));
    }
}
