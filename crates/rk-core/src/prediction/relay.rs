//! Solid-state and time-delay relays (MIL-HDBK-217F section 13.2).

use rk_common::Result;
use rk_config::HandbookTables;

use super::{
    entry, environment, row, HazardRateModel, ModelRate, Overstress, PartCategory, PartInputs,
    PredictionMethod,
};

pub struct SolidStateRelay;

impl HazardRateModel for SolidStateRelay {
    fn category(&self) -> PartCategory {
        PartCategory::Relay
    }

    fn calculate(&self, inputs: &PartInputs, tables: &HandbookTables) -> Result<ModelRate> {
        let t = &tables.relay;
        let pi_q = entry("relay.pi_q", &t.pi_q, inputs.quality_id)?;
        match inputs.method {
            PredictionMethod::PartsCount => {
                let r = row(
                    "relay.part_count_lambda_b",
                    &t.part_count_lambda_b,
                    inputs.construction_id,
                )?;
                let lambda_b = environment("relay.part_count_lambda_b", r, inputs)?;
                Ok(ModelRate::default()
                    .factor("lambda_b", lambda_b)
                    .factor("piQ", pi_q)
                    .with_rate(lambda_b * pi_q))
            }
            PredictionMethod::PartStress => {
                let lambda_b = entry(
                    "relay.part_stress_lambda_b",
                    &t.part_stress_lambda_b,
                    inputs.construction_id,
                )?;
                let pi_e = environment("relay.pi_e", &t.pi_e, inputs)?;
                Ok(ModelRate::default()
                    .factor("lambda_b", lambda_b)
                    .factor("piQ", pi_q)
                    .factor("piE", pi_e)
                    .with_rate(lambda_b * pi_q * pi_e))
            }
        }
    }

    fn overstress(&self, inputs: &PartInputs, _tables: &HandbookTables, harsh: bool) -> Overstress {
        let mut o = Overstress::default();
        let limit = if harsh { 0.7 } else { 0.9 };
        o.check_limit(inputs.current_operating, inputs.current_rated, limit, "current");
        o.check_limit(inputs.power_operating, inputs.power_rated, limit, "power");
        o
    }
}
