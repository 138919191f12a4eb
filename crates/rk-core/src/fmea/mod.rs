//! Failure mode, effects and criticality analysis.

pub mod criticality;
pub mod model;
pub mod rpn;

pub use criticality::calculate_criticality;
pub use model::{
    Action, ActionStatus, Control, ControlType, EffectProbability, FailureMechanism, FailureMode,
    Fmea, Rating,
};
pub use rpn::calculate_rpn;

use rk_common::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::context::CalculationContext;
use crate::log_event;
use crate::logging::{event_names, Stage};

/// Which calculations to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmeaOptions {
    pub criticality: bool,
    pub rpn: bool,
}

impl Default for FmeaOptions {
    fn default() -> Self {
        Self {
            criticality: true,
            rpn: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FmeaSummary {
    pub modes: usize,
    pub mechanisms: usize,
    pub rated_mechanisms: usize,
    pub max_rpn: Option<u32>,
    pub item_criticality: BTreeMap<String, f64>,
}

/// Run the selected calculations on `fmea` in place.
pub fn analyze_fmea(
    fmea: &mut Fmea,
    options: FmeaOptions,
    ctx: &CalculationContext,
) -> Result<FmeaSummary> {
    let settings = &ctx.config.fmea;
    if options.criticality {
        calculate_criticality(fmea, settings)?;
    }
    if options.rpn {
        calculate_rpn(fmea, settings)?;
    }

    let summary = FmeaSummary {
        modes: fmea.modes.len(),
        mechanisms: fmea.mechanisms().count(),
        rated_mechanisms: fmea.mechanisms().filter(|m| m.rpn.is_some()).count(),
        max_rpn: fmea.mechanisms().filter_map(|m| m.rpn).max(),
        item_criticality: fmea.item_criticality.clone(),
    };
    log_event!(
        ctx.log,
        INFO,
        event_names::FMEA_FINISHED,
        Stage::Fmea,
        "fmea calculated",
        modes = summary.modes,
        mechanisms = summary.mechanisms,
        rated = summary.rated_mechanisms
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_both_calculations() {
        let mut fmea = Fmea {
            item_hazard_rate: 2.0e-4,
            modes: vec![FailureMode {
                severity_class: "II".into(),
                mode_ratio: 1.0,
                operating_time: 5.0,
                rpn_severity: Some(Rating::Rank(8)),
                mechanisms: vec![FailureMechanism {
                    rpn_occurrence: Some(Rating::Rank(4)),
                    rpn_detection: Some(Rating::Rank(2)),
                    ..FailureMechanism::default()
                }],
                ..FailureMode::default()
            }],
            ..Fmea::default()
        };
        let summary =
            analyze_fmea(&mut fmea, FmeaOptions::default(), &CalculationContext::default()).unwrap();
        assert_eq!(summary.max_rpn, Some(64));
        assert_eq!(summary.rated_mechanisms, 1);
        assert!((summary.item_criticality["II"] - 1.0e-3).abs() < 1e-15);
    }

    #[test]
    fn criticality_can_be_skipped() {
        let mut fmea = Fmea {
            item_hazard_rate: 2.0e-4,
            modes: vec![FailureMode {
                severity_class: "II".into(),
                mode_ratio: 1.0,
                operating_time: 5.0,
                ..FailureMode::default()
            }],
            ..Fmea::default()
        };
        let options = FmeaOptions {
            criticality: false,
            rpn: true,
        };
        let summary = analyze_fmea(&mut fmea, options, &CalculationContext::default()).unwrap();
        assert!(summary.item_criticality.is_empty());
        assert_eq!(summary.max_rpn, None);
    }
}
