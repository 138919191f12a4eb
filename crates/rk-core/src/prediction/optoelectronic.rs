//! Optoelectronic detectors, isolators and emitters (MIL-HDBK-217F
//! section 6.11).

use rk_common::Result;
use rk_config::HandbookTables;

use super::{
    entry, environment, row, HazardRateModel, ModelRate, Overstress, PartCategory, PartInputs,
    PredictionMethod,
};

const MAX_JUNCTION_TEMPERATURE: f64 = 125.0;

pub struct Detector;

/// Arrhenius junction temperature factor referenced to 25 °C.
pub fn pi_t(activation_temperature: f64, junction: f64) -> f64 {
    (-activation_temperature * (1.0 / (junction + 273.0) - 1.0 / 298.0)).exp()
}

/// Parts-count row: photodetectors (types 1-2), isolators (3-10), emitters.
fn part_count_row(type_id: u32) -> u32 {
    match type_id {
        1 | 2 => 1,
        3..=10 => 2,
        _ => 3,
    }
}

impl HazardRateModel for Detector {
    fn category(&self) -> PartCategory {
        PartCategory::Optoelectronic
    }

    fn calculate(&self, inputs: &PartInputs, tables: &HandbookTables) -> Result<ModelRate> {
        let t = &tables.optoelectronic;
        let pi_q = entry("optoelectronic.pi_q", &t.pi_q, inputs.quality_id)?;
        match inputs.method {
            PredictionMethod::PartsCount => {
                let r = row(
                    "optoelectronic.part_count_lambda_b",
                    &t.part_count_lambda_b,
                    part_count_row(inputs.type_id),
                )?;
                let lambda_b = environment("optoelectronic.part_count_lambda_b", r, inputs)?;
                Ok(ModelRate::default()
                    .factor("lambda_b", lambda_b)
                    .factor("piQ", pi_q)
                    .with_rate(lambda_b * pi_q))
            }
            PredictionMethod::PartStress => {
                let lambda_b = entry("optoelectronic.lambda_b", &t.lambda_b, inputs.type_id)?;
                let pi_t = pi_t(t.activation_temperature, inputs.temperature_junction);
                let pi_e = environment("optoelectronic.pi_e", &t.pi_e, inputs)?;
                Ok(ModelRate::default()
                    .factor("lambda_b", lambda_b)
                    .factor("piT", pi_t)
                    .factor("piQ", pi_q)
                    .factor("piE", pi_e)
                    .with_rate(lambda_b * pi_t * pi_q * pi_e))
            }
        }
    }

    /// The detector limits do not relax in benign environments.
    fn overstress(&self, inputs: &PartInputs, _tables: &HandbookTables, _harsh: bool) -> Overstress {
        let mut o = Overstress::default();
        o.check_limit(inputs.voltage_dc_operating, inputs.voltage_rated, 0.7, "voltage");
        if inputs.temperature_junction > MAX_JUNCTION_TEMPERATURE {
            o.flag("Junction temperature > 125.0C.");
        }
        o
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::category_ids::{OPTOELECTRONIC_DETECTOR, SEMICONDUCTOR};

    fn detector(method: PredictionMethod) -> PartInputs {
        PartInputs {
            environment_active: 2,
            quality_id: 3,
            type_id: 4,
            temperature_junction: 60.0,
            ..PartInputs::new(SEMICONDUCTOR, OPTOELECTRONIC_DETECTOR, method)
        }
    }

    #[test]
    fn junction_factor_is_one_at_reference() {
        assert!((pi_t(2790.0, 25.0) - 1.0).abs() < 1e-12);
        assert!(pi_t(2790.0, 100.0) > pi_t(2790.0, 50.0));
    }

    #[test]
    fn part_stress_rate() {
        let r = Detector
            .calculate(&detector(PredictionMethod::PartStress), &HandbookTables::default())
            .unwrap();
        let expected = 0.013 * pi_t(2790.0, 60.0) * 2.4 * 2.0;
        assert!((r.rate - expected).abs() < 1e-12);
    }

    #[test]
    fn parts_count_groups_types() {
        let tables = HandbookTables::default();
        let mut i = detector(PredictionMethod::PartsCount);
        let isolator = Detector.calculate(&i, &tables).unwrap();
        assert!((isolator.rate - 0.07 * 2.4).abs() < 1e-12);
        i.type_id = 12;
        let emitter = Detector.calculate(&i, &tables).unwrap();
        assert!((emitter.rate - 0.0012 * 2.4).abs() < 1e-12);
    }

    #[test]
    fn overstress_ignores_environment() {
        let mut i = detector(PredictionMethod::PartStress);
        i.voltage_rated = 10.0;
        i.voltage_dc_operating = 8.0;
        i.temperature_junction = 130.0;
        let tables = HandbookTables::default();
        for harsh in [true, false] {
            let o = Detector.overstress(&i, &tables, harsh);
            assert_eq!(
                o.reasons,
                vec![
                    "1. Operating voltage > 70% rated voltage.".to_string(),
                    "2. Junction temperature > 125.0C.".to_string(),
                ]
            );
        }
    }
}
