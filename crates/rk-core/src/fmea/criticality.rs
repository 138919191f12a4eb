//! MIL-STD-1629A Task 102 criticality.

use rk_common::{Error, Result};
use rk_config::FmeaSettings;
use std::collections::BTreeMap;

use super::model::{EffectProbability, Fmea};

/// Resolve β to a probability in [0, 1].
pub fn effect_probability(value: &EffectProbability, settings: &FmeaSettings) -> Result<f64> {
    let beta = match value {
        EffectProbability::Value(v) => *v,
        EffectProbability::Named(name) => *settings
            .effect_probabilities
            .get(name.trim())
            .ok_or_else(|| {
                Error::invalid(
                    "effect_probability",
                    format!("'{}' is not a configured effect probability", name),
                )
            })?,
    };
    if !(0.0..=1.0).contains(&beta) {
        return Err(Error::invalid("effect_probability", format!("{} is outside [0, 1]", beta)));
    }
    Ok(beta)
}

/// Write mode hazard rate and criticality for every mode, then the item
/// criticality per severity class.
///
/// Existing values are replaced. Input is checked in full before anything
/// is written.
pub fn calculate_criticality(fmea: &mut Fmea, settings: &FmeaSettings) -> Result<()> {
    if !(fmea.item_hazard_rate >= 0.0) {
        return Err(Error::invalid("item_hazard_rate", "must be non-negative"));
    }
    let mut betas = Vec::with_capacity(fmea.modes.len());
    for mode in &fmea.modes {
        if !(0.0..=1.0).contains(&mode.mode_ratio) {
            return Err(Error::invalid(
                "mode_ratio",
                format!("{} is outside [0, 1]", mode.mode_ratio),
            ));
        }
        if !(mode.operating_time >= 0.0) {
            return Err(Error::invalid("operating_time", "must be non-negative"));
        }
        betas.push(effect_probability(&mode.effect_probability, settings)?);
    }

    let lambda_p = fmea.item_hazard_rate;
    let mut item = BTreeMap::new();
    for (mode, beta) in fmea.modes.iter_mut().zip(betas) {
        mode.hazard_rate = mode.mode_ratio * lambda_p;
        mode.criticality = beta * mode.hazard_rate * mode.operating_time;
        if !mode.severity_class.is_empty() {
            *item.entry(mode.severity_class.clone()).or_insert(0.0) += mode.criticality;
        }
    }
    fmea.item_criticality = item;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmea::model::FailureMode;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs().max(1e-30)
    }

    fn mode(class: &str, beta: EffectProbability, ratio: f64, t: f64) -> FailureMode {
        FailureMode {
            severity_class: class.to_string(),
            effect_probability: beta,
            mode_ratio: ratio,
            operating_time: t,
            ..FailureMode::default()
        }
    }

    #[test]
    fn mode_and_item_criticality() {
        let mut fmea = Fmea {
            item_hazard_rate: 0.000617,
            modes: vec![
                mode("IV", EffectProbability::Value(1.0), 0.5, 10.0),
                mode("I", EffectProbability::Named("probable_loss".into()), 0.3, 20.0),
                mode("IV", EffectProbability::Value(0.1), 0.2, 10.0),
            ],
            ..Fmea::default()
        };
        calculate_criticality(&mut fmea, &FmeaSettings::default()).unwrap();
        assert!(approx_eq(fmea.modes[0].hazard_rate, 0.0003085));
        assert!(approx_eq(fmea.modes[0].criticality, 0.003085));
        assert!(approx_eq(fmea.modes[1].criticality, 0.5 * 0.3 * 0.000617 * 20.0));
        let iv = 0.003085 + 0.1 * 0.2 * 0.000617 * 10.0;
        assert!(approx_eq(fmea.item_criticality["IV"], iv));
        let lines = fmea.item_criticality_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("I: "));
        assert!(lines[1].starts_with("IV: "));
    }

    #[test]
    fn recalculation_replaces_values() {
        let mut fmea = Fmea {
            item_hazard_rate: 1.0e-3,
            modes: vec![mode("II", EffectProbability::Value(1.0), 1.0, 1.0)],
            ..Fmea::default()
        };
        let settings = FmeaSettings::default();
        calculate_criticality(&mut fmea, &settings).unwrap();
        calculate_criticality(&mut fmea, &settings).unwrap();
        assert!(approx_eq(fmea.item_criticality["II"], 1.0e-3));
        fmea.modes[0].severity_class = "III".into();
        calculate_criticality(&mut fmea, &settings).unwrap();
        assert!(!fmea.item_criticality.contains_key("II"));
    }

    #[test]
    fn unknown_effect_name_leaves_results_untouched() {
        let mut fmea = Fmea {
            item_hazard_rate: 1.0e-3,
            modes: vec![
                mode("II", EffectProbability::Value(1.0), 1.0, 1.0),
                mode("II", EffectProbability::Named("certain_doom".into()), 1.0, 1.0),
            ],
            ..Fmea::default()
        };
        let err = calculate_criticality(&mut fmea, &FmeaSettings::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert_eq!(fmea.modes[0].criticality, 0.0);
    }

    #[test]
    fn mode_ratio_out_of_range() {
        let mut fmea = Fmea {
            modes: vec![mode("I", EffectProbability::Value(1.0), 1.5, 1.0)],
            ..Fmea::default()
        };
        assert!(calculate_criticality(&mut fmea, &FmeaSettings::default()).is_err());
    }
}
