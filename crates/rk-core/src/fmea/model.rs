//! FMEA worksheet: failure modes, their mechanisms, and the controls and
//! actions attached to each mechanism.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An RPN rating given either as a 1-10 rank or as a name from the
/// configured ordinal scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    Rank(u32),
    Name(String),
}

/// Failure effect probability β, numeric or a configured name such as
/// `probable_loss`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectProbability {
    Value(f64),
    Named(String),
}

impl Default for EffectProbability {
    fn default() -> Self {
        EffectProbability::Value(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
    #[default]
    Prevention,
    Detection,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Control {
    pub description: String,
    pub control_type: ControlType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    pub recommended: String,
    pub category: String,
    pub owner: String,
    pub due_date: Option<NaiveDate>,
    pub approved_date: Option<NaiveDate>,
    pub closed_date: Option<NaiveDate>,
    pub status: ActionStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureMechanism {
    pub description: String,
    pub rpn_occurrence: Option<Rating>,
    pub rpn_detection: Option<Rating>,
    pub rpn_occurrence_new: Option<Rating>,
    pub rpn_detection_new: Option<Rating>,
    pub controls: Vec<Control>,
    pub actions: Vec<Action>,

    /// Written by the RPN calculation; `None` while unrated.
    pub rpn: Option<u32>,
    pub rpn_new: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureMode {
    pub description: String,
    pub mission_phase: String,
    pub effect_local: String,
    pub effect_next: String,
    pub effect_end: String,
    /// MIL-STD-1629A severity class, e.g. `I` to `IV`.
    pub severity_class: String,
    pub effect_probability: EffectProbability,
    /// Fraction α of the item hazard rate attributed to this mode.
    pub mode_ratio: f64,
    /// Operating time t, hours.
    pub operating_time: f64,
    pub rpn_severity: Option<Rating>,
    pub rpn_severity_new: Option<Rating>,
    pub mechanisms: Vec<FailureMechanism>,

    /// α·λp, written by the criticality calculation.
    pub hazard_rate: f64,
    /// β·α·λp·t.
    pub criticality: f64,
}

impl Default for FailureMode {
    fn default() -> Self {
        Self {
            description: String::new(),
            mission_phase: String::new(),
            effect_local: String::new(),
            effect_next: String::new(),
            effect_end: String::new(),
            severity_class: String::new(),
            effect_probability: EffectProbability::default(),
            mode_ratio: 0.0,
            operating_time: 0.0,
            rpn_severity: None,
            rpn_severity_new: None,
            mechanisms: Vec::new(),
            hazard_rate: 0.0,
            criticality: 0.0,
        }
    }
}

/// The FMEA of one hardware item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fmea {
    pub item: String,
    /// Item hazard rate λp, per hour.
    pub item_hazard_rate: f64,
    pub modes: Vec<FailureMode>,

    /// Σ mode criticality per severity class.
    pub item_criticality: BTreeMap<String, f64>,
}

impl Fmea {
    /// Item criticality as `"<class>: <value>"` lines.
    pub fn item_criticality_lines(&self) -> Vec<String> {
        self.item_criticality
            .iter()
            .map(|(class, value)| format!("{}: {}", class, value))
            .collect()
    }

    pub fn mechanisms(&self) -> impl Iterator<Item = &FailureMechanism> {
        self.modes.iter().flat_map(|m| m.mechanisms.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_accept_rank_or_name() {
        let r: Rating = serde_json::from_str("7").unwrap();
        assert_eq!(r, Rating::Rank(7));
        let r: Rating = serde_json::from_str("\"High\"").unwrap();
        assert_eq!(r, Rating::Name("High".to_string()));
    }

    #[test]
    fn worksheet_defaults_from_partial_json() {
        let fmea: Fmea = serde_json::from_str(
            r#"{"item_hazard_rate": 1e-4, "modes": [{"severity_class": "II",
                "effect_probability": "possible_loss",
                "mechanisms": [{"rpn_occurrence": 3,
                    "actions": [{"owner": "QA", "due_date": "2024-03-01"}]}]}]}"#,
        )
        .unwrap();
        let mode = &fmea.modes[0];
        assert_eq!(mode.effect_probability, EffectProbability::Named("possible_loss".into()));
        assert_eq!(mode.mechanisms[0].rpn, None);
        assert_eq!(
            mode.mechanisms[0].actions[0].due_date,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(fmea.mechanisms().count(), 1);
    }
}
