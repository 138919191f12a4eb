//! Typed calculation settings.
//!
//! Every section is `#[serde(default)]`, so a configuration file only
//! needs to name what it overrides.

use rk_common::{ConfidenceMethod, ConfidenceType, FitMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tables::HandbookTables;

/// Complete ramkit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version for compatibility checking.
    pub schema_version: String,

    /// Defaults for survival and growth analyses.
    pub analysis: AnalysisSettings,

    /// Hazard-rate prediction settings.
    pub prediction: PredictionSettings,

    /// FMEA scales and probabilities.
    pub fmea: FmeaSettings,

    /// Handbook lookup tables.
    pub tables: HandbookTables,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            analysis: AnalysisSettings::default(),
            prediction: PredictionSettings::default(),
            fmea: FmeaSettings::default(),
            tables: HandbookTables::default(),
        }
    }
}

/// Defaults applied when a dataset leaves a method unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Confidence level in (0, 1).
    pub confidence: f64,
    pub confidence_type: ConfidenceType,
    pub confidence_method: ConfidenceMethod,
    pub fit_method: FitMethod,
    /// Resamples drawn for bootstrap bounds.
    pub bootstrap_samples: usize,
    /// Seed for the bootstrap generator, so results are reproducible.
    pub bootstrap_seed: u64,
    /// Convergence tolerance for the iterative solvers.
    pub solver_tolerance: f64,
    /// Iteration cap for the iterative solvers.
    pub max_iterations: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            confidence: 0.75,
            confidence_type: ConfidenceType::TwoSided,
            confidence_method: ConfidenceMethod::FisherMatrix,
            fit_method: FitMethod::Mle,
            bootstrap_samples: 1000,
            bootstrap_seed: 42,
            solver_tolerance: 1e-10,
            max_iterations: 200,
        }
    }
}

/// Hazard-rate prediction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionSettings {
    /// Divisor converting handbook rates (per 10⁶ h) to per-hour rates.
    pub rate_multiplier: f64,
    /// Active environment ids treated as benign for overstress checks.
    pub benign_environments: Vec<u32>,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            rate_multiplier: 1.0e6,
            benign_environments: vec![1, 2, 4, 11],
        }
    }
}

impl PredictionSettings {
    /// Whether an active environment id is harsh.
    pub fn is_harsh(&self, environment_id: u32) -> bool {
        !self.benign_environments.contains(&environment_id)
    }
}

/// FMEA scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmeaSettings {
    /// Named failure-effect probabilities (MIL-STD-1629A β).
    pub effect_probabilities: BTreeMap<String, f64>,
    /// RPN severity names for ranks 1-10.
    pub severity_scale: Vec<String>,
    /// RPN occurrence names for ranks 1-10.
    pub occurrence_scale: Vec<String>,
    /// RPN detection names for ranks 1-10.
    pub detection_scale: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for FmeaSettings {
    fn default() -> Self {
        Self {
            effect_probabilities: [
                ("actual_loss", 1.0),
                ("probable_loss", 0.5),
                ("possible_loss", 0.1),
                ("no_effect", 0.0),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
            severity_scale: names(&[
                "None",
                "Very Minor",
                "Minor",
                "Very Low",
                "Low",
                "Moderate",
                "High",
                "Very High",
                "Hazardous with Warning",
                "Hazardous without Warning",
            ]),
            occurrence_scale: names(&[
                "Remote",
                "Very Low",
                "Low",
                "Moderately Low",
                "Moderate",
                "Moderately High",
                "High",
                "Very High",
                "Extremely High",
                "Almost Certain",
            ]),
            detection_scale: names(&[
                "Almost Certain",
                "Very High",
                "High",
                "Moderately High",
                "Moderate",
                "Low",
                "Very Low",
                "Remote",
                "Very Remote",
                "Absolute Uncertainty",
            ]),
        }
    }
}

/// Position of `name` in an ordinal scale, as a 1-based rank.
///
/// Matching ignores case and surrounding whitespace.
pub fn rank_of(scale: &[String], name: &str) -> Option<u32> {
    let wanted = name.trim().to_lowercase();
    scale
        .iter()
        .position(|s| s.to_lowercase() == wanted)
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_schema_version() {
        let config = Config::default();
        assert_eq!(config.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert_eq!(config.analysis.confidence, 0.75);
        assert_eq!(config.prediction.rate_multiplier, 1.0e6);
    }

    #[test]
    fn harsh_environment_classification() {
        let p = PredictionSettings::default();
        assert!(!p.is_harsh(1));
        assert!(!p.is_harsh(11));
        assert!(p.is_harsh(3));
        assert!(p.is_harsh(14));
    }

    #[test]
    fn rank_lookup_is_case_insensitive() {
        let f = FmeaSettings::default();
        assert_eq!(rank_of(&f.severity_scale, "very high"), Some(8));
        assert_eq!(rank_of(&f.detection_scale, " Almost Certain "), Some(1));
        assert_eq!(rank_of(&f.occurrence_scale, "never"), None);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let json = r#"{ "analysis": { "confidence": 0.9 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.analysis.confidence, 0.9);
        assert_eq!(config.analysis.bootstrap_samples, 1000);
        assert_eq!(config.prediction, PredictionSettings::default());
    }
}
