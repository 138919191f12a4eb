//! Meters (MIL-HDBK-217F section 18): elapsed-time (subcategory 1) and
//! panel (subcategory 2).

use rk_common::{Error, Result};
use rk_config::HandbookTables;

use super::{
    entry, environment, row, HazardRateModel, ModelRate, Overstress, PartCategory, PartInputs,
    PredictionMethod,
};

const ELAPSED_TIME: u32 = 1;
const PANEL: u32 = 2;

pub struct Meter;

/// Temperature stress factor from the active/rated temperature ratio.
pub fn pi_t(inputs: &PartInputs) -> f64 {
    let ratio = if inputs.temperature_rated_max > 0.0 {
        inputs.temperature_active / inputs.temperature_rated_max
    } else {
        0.0
    };
    match ratio {
        r if r <= 0.5 => 0.5,
        r if r <= 0.6 => 0.6,
        r if r <= 0.8 => 0.8,
        _ => 1.0,
    }
}

fn elapsed_time(inputs: &PartInputs, tables: &HandbookTables) -> Result<ModelRate> {
    let t = &tables.meter;
    match inputs.method {
        PredictionMethod::PartsCount => {
            let r = row("meter.elapsed_part_count_lambda_b", &t.elapsed_part_count_lambda_b, inputs.application_id)?;
            let lambda_b = environment("meter.elapsed_part_count_lambda_b", r, inputs)?;
            Ok(ModelRate::default().factor("lambda_b", lambda_b).with_rate(lambda_b))
        }
        PredictionMethod::PartStress => {
            let lambda_b = entry("meter.elapsed_lambda_b", &t.elapsed_lambda_b, inputs.application_id)?;
            let pi_e = environment("meter.elapsed_pi_e", &t.elapsed_pi_e, inputs)?;
            let pi_t = pi_t(inputs);
            Ok(ModelRate::default()
                .factor("lambda_b", lambda_b)
                .factor("piT", pi_t)
                .factor("piE", pi_e)
                .with_rate(lambda_b * pi_t * pi_e))
        }
    }
}

fn panel(inputs: &PartInputs, tables: &HandbookTables) -> Result<ModelRate> {
    let t = &tables.meter;
    match inputs.method {
        PredictionMethod::PartsCount => {
            let r = row("meter.panel_part_count_lambda_b", &t.panel_part_count_lambda_b, inputs.application_id)?;
            let lambda_b = environment("meter.panel_part_count_lambda_b", r, inputs)?;
            Ok(ModelRate::default().factor("lambda_b", lambda_b).with_rate(lambda_b))
        }
        PredictionMethod::PartStress => {
            let lambda_b = t.panel_lambda_b;
            let pi_a = if inputs.application_id == 1 { 1.0 } else { 1.7 };
            let pi_f = if inputs.function_id < 3 { 1.0 } else { 2.8 };
            let pi_q = entry("meter.panel_pi_q", &t.panel_pi_q, inputs.quality_id)?;
            let pi_e = environment("meter.panel_pi_e", &t.panel_pi_e, inputs)?;
            Ok(ModelRate::default()
                .factor("lambda_b", lambda_b)
                .factor("piA", pi_a)
                .factor("piF", pi_f)
                .factor("piQ", pi_q)
                .factor("piE", pi_e)
                .with_rate(lambda_b * pi_a * pi_f * pi_q * pi_e))
        }
    }
}

impl HazardRateModel for Meter {
    fn category(&self) -> PartCategory {
        PartCategory::Meter
    }

    fn calculate(&self, inputs: &PartInputs, tables: &HandbookTables) -> Result<ModelRate> {
        match inputs.subcategory_id {
            ELAPSED_TIME => elapsed_time(inputs, tables),
            PANEL => panel(inputs, tables),
            sub => Err(Error::UnsupportedCategory {
                category: inputs.category_id,
                subcategory: sub,
            }),
        }
    }

    fn overstress(&self, inputs: &PartInputs, _tables: &HandbookTables, harsh: bool) -> Overstress {
        let mut o = Overstress::default();
        let limit = if harsh { 0.7 } else { 0.9 };
        o.check_limit(inputs.voltage_dc_operating, inputs.voltage_rated, limit, "voltage");
        o.check_limit(inputs.current_operating, inputs.current_rated, limit, "current");
        o
    }
}
