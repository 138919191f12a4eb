//! Structured event vocabulary for logging.
//!
//! Every event carries the run id of the calculation that produced it and
//! the engine stage, so JSONL output can be grouped per run.

use rk_common::RunId;
use serde::{Deserialize, Serialize};

/// Engine stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Non-parametric and parametric life-data fits.
    Survival,
    /// Reliability growth models and planning.
    Growth,
    /// Component hazard-rate prediction.
    Prediction,
    /// Hardware-tree rollup and similar-item analysis.
    Rollup,
    Allocation,
    Fmea,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Survival => "survival",
            Stage::Growth => "growth",
            Stage::Prediction => "prediction",
            Stage::Rollup => "rollup",
            Stage::Allocation => "allocation",
            Stage::Fmea => "fmea",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const ANALYSIS_STARTED: &str = "analysis.started";
    pub const ANALYSIS_FINISHED: &str = "analysis.finished";

    // Numerical substitutions
    pub const RESULT_DEGRADED: &str = "result.degraded";

    // Prediction
    pub const PREDICTION_FINISHED: &str = "prediction.finished";
    pub const PREDICTION_OVERSTRESS: &str = "prediction.overstress";
    pub const PREDICTION_CHECK: &str = "prediction.check_variables";

    // Rollup
    pub const ROLLUP_FINISHED: &str = "rollup.finished";

    pub const ALLOCATION_FINISHED: &str = "allocation.finished";
    pub const FMEA_FINISHED: &str = "fmea.finished";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation fields shared by every event of one calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    pub run_id: RunId,
}

impl LogContext {
    pub fn new(run_id: RunId) -> Self {
        Self { run_id }
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new(RunId::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serialization() {
        assert_eq!(serde_json::to_string(&Stage::Survival).unwrap(), "\"survival\"");
        assert_eq!(serde_json::to_string(&Stage::Fmea).unwrap(), "\"fmea\"");
    }

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in [
            Stage::Init,
            Stage::Survival,
            Stage::Growth,
            Stage::Prediction,
            Stage::Rollup,
            Stage::Allocation,
            Stage::Fmea,
        ] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage));
        }
    }

    #[test]
    fn test_event_names_are_dotted() {
        for name in [
            event_names::ANALYSIS_STARTED,
            event_names::RESULT_DEGRADED,
            event_names::PREDICTION_OVERSTRESS,
            event_names::CONFIG_LOADED,
        ] {
            assert!(name.contains('.'), "{name}");
        }
    }
}
