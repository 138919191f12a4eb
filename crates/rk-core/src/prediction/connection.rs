//! Connections (MIL-HDBK-217F sections 15-17).
//!
//! Subcategories: 1 circular/rack/panel connector, 2 PCB edge connector,
//! 3 IC socket, 4 plated-through-hole interconnect, 5 non-PTH connection.

use rk_common::{Error, Result};
use rk_config::HandbookTables;

use super::{
    entry, environment, keyed, row, HazardRateModel, ModelRate, Overstress, PartCategory,
    PartInputs, PredictionMethod,
};

/// Minimum margin (°C) between contact and maximum rated temperature in a
/// harsh environment.
const HARSH_TEMPERATURE_MARGIN: f64 = 25.0;

pub struct Connection;

/// Insert temperature rise (°C) from contact current.
pub fn temperature_rise(inputs: &PartInputs, tables: &HandbookTables) -> f64 {
    let fo = tables
        .connection
        .contact_gauge_factors
        .get(&inputs.subcategory_id)
        .and_then(|g| g.get(&inputs.contact_gauge))
        .copied()
        .unwrap_or(1.0);
    fo * inputs.current_operating.powf(1.85)
}

/// Mate/unmate factor by cycles per 1000 hours.
fn pi_k(tables: &HandbookTables, cycles: f64) -> Result<f64> {
    let idx = match cycles {
        c if c <= 0.05 => 1,
        c if c <= 0.5 => 2,
        c if c <= 5.0 => 3,
        c if c <= 50.0 => 4,
        _ => 5,
    };
    entry("connection.pi_k", &tables.connection.pi_k, idx)
}

/// Active pins factor.
fn pi_p(pins: u32) -> f64 {
    let n = pins.saturating_sub(1) as f64;
    (n / 10.0).powf(0.51064).exp()
}

/// Complexity factor for PTH boards.
fn pi_c(planes: u32) -> f64 {
    if planes > 2 {
        0.65 * (planes as f64).powf(0.63)
    } else {
        1.0
    }
}

fn part_stress_lambda_b(inputs: &PartInputs, tables: &HandbookTables) -> Result<f64> {
    let t = &tables.connection;
    let contact = inputs.temperature_active + temperature_rise(inputs, tables) + 273.0;
    match inputs.subcategory_id {
        1 => {
            let specs = keyed("connection.reference_keys", &t.reference_keys, inputs.type_id)?;
            let keys = keyed("connection.reference_keys", specs, inputs.specification_id)?;
            let key = inputs
                .insert_id
                .checked_sub(1)
                .and_then(|i| keys.get(i as usize))
                .copied()
                .ok_or_else(|| Error::lookup("connection.insert", inputs.insert_id))?;
            let reference = *keyed("connection.reference_temperatures", &t.reference_temperatures, key)?;
            let [f0, f1, f2] = *keyed("connection.lambda_b_factors", &t.lambda_b_factors, key)?;
            Ok(f0 * (f1 / contact + (contact / reference).powf(f2)).exp())
        }
        2 => {
            let [f0, f1, f2] = t.edge_lambda_b_factors;
            Ok(f0 * (f1 / contact + (contact / t.edge_reference_temperature).powf(f2)).exp())
        }
        3 => {
            let rates = keyed("connection.part_stress_lambda_b", &t.part_stress_lambda_b, 3)?;
            entry("connection.part_stress_lambda_b", rates, 1)
        }
        sub => {
            let rates = keyed("connection.part_stress_lambda_b", &t.part_stress_lambda_b, sub)?;
            entry("connection.part_stress_lambda_b", rates, inputs.type_id)
        }
    }
}

fn part_stress_pi_e(inputs: &PartInputs, tables: &HandbookTables) -> Result<f64> {
    let rows = keyed("connection.pi_e", &tables.connection.pi_e, inputs.subcategory_id)?;
    let r = match inputs.subcategory_id {
        1 | 2 => row("connection.pi_e", rows, inputs.quality_id)?,
        _ => row("connection.pi_e", rows, 1)?,
    };
    environment("connection.pi_e", r, inputs)
}

impl HazardRateModel for Connection {
    fn category(&self) -> PartCategory {
        PartCategory::Connection
    }

    fn calculate(&self, inputs: &PartInputs, tables: &HandbookTables) -> Result<ModelRate> {
        let t = &tables.connection;
        let pi_q = entry("connection.pi_q", &t.pi_q, inputs.quality_id)?;
        let sub = inputs.subcategory_id;

        match inputs.method {
            PredictionMethod::PartsCount => {
                let rows = keyed("connection.part_count_lambda_b", &t.part_count_lambda_b, sub)?;
                let r = match sub {
                    1 | 5 => row("connection.part_count_lambda_b", rows, inputs.type_id)?,
                    _ => row("connection.part_count_lambda_b", rows, 1)?,
                };
                let lambda_b = environment("connection.part_count_lambda_b", r, inputs)?;
                Ok(ModelRate::default()
                    .factor("lambda_b", lambda_b)
                    .factor("piQ", pi_q)
                    .with_rate(lambda_b * pi_q))
            }
            PredictionMethod::PartStress => {
                let lambda_b = part_stress_lambda_b(inputs, tables)?;
                let pi_e = part_stress_pi_e(inputs, tables)?;
                let base = ModelRate::default()
                    .factor("lambda_b", lambda_b)
                    .factor("piE", pi_e);
                Ok(match sub {
                    3 => {
                        let pi_p = pi_p(inputs.n_active_pins);
                        base.factor("piP", pi_p).with_rate(lambda_b * pi_e * pi_p)
                    }
                    4 => {
                        let pi_c = pi_c(inputs.n_circuit_planes);
                        let joints = inputs.n_wave_soldered as f64 * pi_c
                            + inputs.n_hand_soldered as f64 * (pi_c + 13.0);
                        base.factor("piC", pi_c)
                            .factor("piQ", pi_q)
                            .with_rate(lambda_b * pi_e * joints * pi_q)
                    }
                    5 => base.factor("piQ", pi_q).with_rate(lambda_b * pi_e * pi_q),
                    _ => {
                        let pi_k = pi_k(tables, inputs.n_cycles)?;
                        let pi_p = pi_p(inputs.n_active_pins);
                        base.factor("piK", pi_k)
                            .factor("piP", pi_p)
                            .with_rate(lambda_b * pi_e * pi_k * pi_p)
                    }
                })
            }
        }
    }

    fn overstress(&self, inputs: &PartInputs, tables: &HandbookTables, harsh: bool) -> Overstress {
        let mut o = Overstress::default();
        let limit = if harsh { 0.7 } else { 0.9 };
        o.check_limit(inputs.voltage_dc_operating, inputs.voltage_rated, limit, "voltage");
        o.check_limit(inputs.current_operating, inputs.current_rated, limit, "current");
        if harsh {
            let rise = temperature_rise(inputs, tables);
            let margin = inputs.temperature_rated_max - (inputs.temperature_active + rise);
            if margin < HARSH_TEMPERATURE_MARGIN {
                o.flag("Operating temperature within 25.0C of maximum rated temperature.");
            }
        }
        o
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::category_ids::CONNECTION;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1e-300)
    }

    fn inputs(sub: u32, method: PredictionMethod) -> PartInputs {
        PartInputs {
            environment_active: 3,
            quality_id: 1,
            temperature_active: 40.0,
            temperature_rated_max: 200.0,
            current_operating: 2.0,
            contact_gauge: 20,
            n_active_pins: 21,
            n_cycles: 2.0,
            ..PartInputs::new(CONNECTION, sub, method)
        }
    }

    #[test]
    fn parts_count_uses_type_row() {
        let tables = HandbookTables::default();
        let mut i = inputs(5, PredictionMethod::PartsCount);
        i.type_id = 2;
        let r = Connection.calculate(&i, &tables).unwrap();
        assert!(approx_eq(r.rate, 0.00096 * 1.0, 1e-12));
    }

    #[test]
    fn temperature_rise_uses_gauge_factor_or_one() {
        let tables = HandbookTables::default();
        let i = inputs(1, PredictionMethod::PartStress);
        assert!(approx_eq(temperature_rise(&i, &tables), 0.64 * 2.0f64.powf(1.85), 1e-12));
        let mut j = i.clone();
        j.contact_gauge = 99;
        assert!(approx_eq(temperature_rise(&j, &tables), 2.0f64.powf(1.85), 1e-12));
    }

    #[test]
    fn circular_connector_part_stress() {
        let tables = HandbookTables::default();
        let i = inputs(1, PredictionMethod::PartStress);
        let r = Connection.calculate(&i, &tables).unwrap();

        // type 1, spec 1, insert 1 resolves to reference key 2
        let tc = 40.0 + 0.64 * 2.0f64.powf(1.85) + 273.0;
        let lambda_b = 0.431 * (-2073.6 / tc + (tc / 423.0).powf(4.66)).exp();
        let pi_e = 8.0;
        let pi_k = 2.0;
        let pi_p = (2.0f64).powf(0.51064).exp();
        assert!(approx_eq(r.rate, lambda_b * pi_e * pi_k * pi_p, 1e-10));
        assert_eq!(r.factors[0].0, "lambda_b");
    }

    #[test]
    fn ic_socket_uses_constant_base_rate() {
        let tables = HandbookTables::default();
        let i = inputs(3, PredictionMethod::PartStress);
        let r = Connection.calculate(&i, &tables).unwrap();
        let pi_p = (2.0f64).powf(0.51064).exp();
        assert!(approx_eq(r.rate, 0.00042 * 14.0 * pi_p, 1e-12));
    }

    #[test]
    fn pth_board_counts_solder_joints() {
        let tables = HandbookTables::default();
        let mut i = inputs(4, PredictionMethod::PartStress);
        i.type_id = 1;
        i.n_circuit_planes = 4;
        i.n_wave_soldered = 100;
        i.n_hand_soldered = 2;
        let r = Connection.calculate(&i, &tables).unwrap();
        let pc = 0.65 * 4.0f64.powf(0.63);
        let expected = 0.000041 * 7.0 * (100.0 * pc + 2.0 * (pc + 13.0)) * 1.0;
        assert!(approx_eq(r.rate, expected, 1e-12));
    }

    #[test]
    fn mate_unmate_bands() {
        let tables = HandbookTables::default();
        assert_eq!(pi_k(&tables, 0.05).unwrap(), 1.0);
        assert_eq!(pi_k(&tables, 0.4).unwrap(), 1.5);
        assert_eq!(pi_k(&tables, 50.0).unwrap(), 3.0);
        assert_eq!(pi_k(&tables, 51.0).unwrap(), 4.0);
    }

    #[test]
    fn bad_insert_is_lookup_error() {
        let tables = HandbookTables::default();
        let mut i = inputs(1, PredictionMethod::PartStress);
        i.insert_id = 40;
        assert!(Connection.calculate(&i, &tables).is_err());
    }

    #[test]
    fn harsh_temperature_margin() {
        let mut i = inputs(1, PredictionMethod::PartStress);
        i.current_operating = 0.0;
        i.temperature_active = 110.0;
        i.temperature_rated_max = 125.0;
        let tables = HandbookTables::default();
        let o = Connection.overstress(&i, &tables, true);
        assert_eq!(
            o.reasons,
            vec!["1. Operating temperature within 25.0C of maximum rated temperature.".to_string()]
        );
        assert!(!Connection.overstress(&i, &tables, false).overstressed);
    }

    #[test]
    fn benign_limit_is_ninety_percent() {
        let mut i = inputs(1, PredictionMethod::PartStress);
        i.voltage_rated = 100.0;
        i.voltage_dc_operating = 91.0;
        i.current_rated = 10.0;
        i.current_operating = 9.5;
        let o = Connection.overstress(&i, &HandbookTables::default(), false);
        assert_eq!(o.reasons.len(), 2);
        assert!(o.reasons[0].contains("90%"));
        assert!(o.reasons[1].starts_with("2. Operating current"));
    }
}
