//! Capacitors (MIL-HDBK-217F section 10), subcategories 1-19.

use rk_common::{Error, Result};
use rk_config::HandbookTables;

use super::{
    entry, environment, keyed, row, HazardRateModel, ModelRate, OperatingRatios, Overstress,
    PartCategory, PartInputs, PredictionMethod,
};

// Subcategories with an extra factor.
const SOLID_TANTALUM: u32 = 12;
const NON_SOLID_TANTALUM: u32 = 13;
const GAS_OR_VACUUM: u32 = 19;

pub struct Capacitor;

/// Applied DC plus AC peak voltage.
fn operating_voltage(inputs: &PartInputs) -> f64 {
    inputs.voltage_dc_operating + inputs.voltage_ac_operating
}

/// Series resistance factor from ohms per volt of circuit.
pub fn pi_sr(inputs: &PartInputs) -> f64 {
    let volts = operating_voltage(inputs);
    let ohms_per_volt = if volts > 0.0 { inputs.resistance / volts } else { 0.0 };
    match ohms_per_volt {
        r if r > 0.0 && r <= 0.1 => 0.33,
        r if r > 0.1 && r <= 0.2 => 0.27,
        r if r > 0.2 && r <= 0.4 => 0.2,
        r if r > 0.4 && r <= 0.6 => 0.13,
        r if r > 0.6 && r <= 0.8 => 0.1,
        _ => 0.066,
    }
}

/// `f0 * ((S/f1)^f2 + 1) * exp(f3 * ((T + 273)/Tref)^f4)`
fn part_stress_lambda_b(inputs: &PartInputs, tables: &HandbookTables, voltage_ratio: f64) -> Result<f64> {
    let t = &tables.capacitor;
    let rated = inputs.temperature_rated_max;
    if !(rated >= 0.0) || rated.fract() != 0.0 {
        return Err(Error::invalid(
            "temperature_rated_max",
            format!("must be a whole number of degrees, got {}", rated),
        ));
    }
    let reference = *keyed("capacitor.reference_temperatures", &t.reference_temperatures, rated as u32)?;
    let [f0, f1, f2, f3, f4] = *keyed("capacitor.lambda_b_factors", &t.lambda_b_factors, inputs.subcategory_id)?;
    let thermal = ((inputs.temperature_active + 273.0) / reference).powf(f4);
    Ok(f0 * ((voltage_ratio / f1).powf(f2) + 1.0) * (f3 * thermal).exp())
}

impl HazardRateModel for Capacitor {
    fn category(&self) -> PartCategory {
        PartCategory::Capacitor
    }

    fn calculate(&self, inputs: &PartInputs, tables: &HandbookTables) -> Result<ModelRate> {
        let t = &tables.capacitor;
        let sub = inputs.subcategory_id;

        match inputs.method {
            PredictionMethod::PartsCount => {
                let rows = keyed("capacitor.part_count_lambda_b", &t.part_count_lambda_b, sub)?;
                let r = if sub == 1 {
                    row("capacitor.part_count_lambda_b", rows, inputs.specification_id)?
                } else {
                    row("capacitor.part_count_lambda_b", rows, 1)?
                };
                let lambda_b = environment("capacitor.part_count_lambda_b", r, inputs)?;
                let pi_q = entry("capacitor.part_count_pi_q", &t.part_count_pi_q, inputs.quality_id)?;
                Ok(ModelRate::default()
                    .factor("lambda_b", lambda_b)
                    .factor("piQ", pi_q)
                    .with_rate(lambda_b * pi_q))
            }
            PredictionMethod::PartStress => {
                let ratios = self.ratios(inputs);
                let lambda_b = part_stress_lambda_b(inputs, tables, ratios.voltage)?;
                let qualities = keyed("capacitor.part_stress_pi_q", &t.part_stress_pi_q, sub)?;
                let pi_q = entry("capacitor.part_stress_pi_q", qualities, inputs.quality_id)?;
                let pi_e = environment("capacitor.pi_e", &t.pi_e, inputs)?;
                let [c0, c1] = *keyed("capacitor.capacitance_factors", &t.capacitance_factors, sub)?;
                let pi_cv = c0 * inputs.capacitance.powf(c1);

                let rate = ModelRate::default()
                    .factor("lambda_b", lambda_b)
                    .factor("piQ", pi_q)
                    .factor("piE", pi_e);
                let base = lambda_b * pi_q * pi_e;
                Ok(match sub {
                    SOLID_TANTALUM => {
                        let pi_sr = pi_sr(inputs);
                        rate.factor("piCV", pi_cv)
                            .factor("piSR", pi_sr)
                            .with_rate(base * pi_cv * pi_sr)
                    }
                    NON_SOLID_TANTALUM => {
                        let pi_c = *keyed("capacitor.pi_c", &t.pi_c, inputs.construction_id)?;
                        rate.factor("piCV", pi_cv)
                            .factor("piC", pi_c)
                            .with_rate(base * pi_cv * pi_c)
                    }
                    GAS_OR_VACUUM => {
                        let pi_cf = *keyed("capacitor.pi_cf", &t.pi_cf, inputs.configuration_id)?;
                        rate.factor("piCF", pi_cf).with_rate(base * pi_cf)
                    }
                    _ => rate.factor("piCV", pi_cv).with_rate(base * pi_cv),
                })
            }
        }
    }

    fn overstress(&self, inputs: &PartInputs, _tables: &HandbookTables, harsh: bool) -> Overstress {
        let mut o = Overstress::default();
        let voltage = operating_voltage(inputs);
        if harsh {
            o.check_limit(voltage, inputs.voltage_rated, 0.6, "voltage");
            if inputs.temperature_rated_max - inputs.temperature_active <= 10.0 {
                o.flag("Operating temperature within 10.0C of maximum rated temperature.");
            }
        } else {
            o.check_limit(voltage, inputs.voltage_rated, 0.9, "voltage");
        }
        o
    }

    fn ratios(&self, inputs: &PartInputs) -> OperatingRatios {
        OperatingRatios::from_inputs(inputs, operating_voltage(inputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::category_ids::CAPACITOR;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1e-300)
    }

    fn ceramic() -> PartInputs {
        PartInputs {
            environment_active: 2,
            quality_id: 4,
            temperature_active: 45.0,
            temperature_rated_max: 85.0,
            voltage_rated: 50.0,
            voltage_dc_operating: 10.0,
            voltage_ac_operating: 2.5,
            capacitance: 0.1,
            ..PartInputs::new(CAPACITOR, 10, PredictionMethod::PartStress)
        }
    }

    #[test]
    fn voltage_ratio_includes_ac() {
        let r = Capacitor.ratios(&ceramic());
        assert!(approx_eq(r.voltage, 0.25, 1e-12));
        assert_eq!(r.current, 0.0);
    }

    #[test]
    fn general_purpose_ceramic_part_stress() {
        let tables = HandbookTables::default();
        let r = Capacitor.calculate(&ceramic(), &tables).unwrap();
        let lambda_b = 0.0003 * ((0.25f64 / 0.3).powf(3.0) + 1.0) * (((45.0 + 273.0) / 358.0f64).powf(1.0)).exp();
        let pi_cv = 0.41 * 0.1f64.powf(0.11);
        assert!(approx_eq(r.rate, lambda_b * 1.0 * 6.0 * pi_cv, 1e-12));
        let names: Vec<&str> = r.factors.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["lambda_b", "piQ", "piE", "piCV"]);
    }

    #[test]
    fn specification_row_for_paper_bypass() {
        let tables = HandbookTables::default();
        let mut i = ceramic();
        i.subcategory_id = 1;
        i.method = PredictionMethod::PartsCount;
        i.specification_id = 2;
        let r = Capacitor.calculate(&i, &tables).unwrap();
        assert!(approx_eq(r.rate, 0.0087 * 1.0, 1e-12));
    }

    #[test]
    fn solid_tantalum_series_resistance_bands() {
        let mut i = ceramic();
        i.voltage_ac_operating = 0.0;
        i.resistance = 0.5;
        assert_eq!(pi_sr(&i), 0.33);
        i.resistance = 3.0;
        assert_eq!(pi_sr(&i), 0.2);
        i.resistance = 100.0;
        assert_eq!(pi_sr(&i), 0.066);
        i.resistance = 0.0;
        assert_eq!(pi_sr(&i), 0.066);
    }

    #[test]
    fn gas_capacitor_drops_capacitance_factor() {
        let tables = HandbookTables::default();
        let mut i = ceramic();
        i.subcategory_id = 19;
        i.quality_id = 1;
        i.configuration_id = 1;
        let r = Capacitor.calculate(&i, &tables).unwrap();
        assert!(r.factors.iter().all(|(n, _)| *n != "piCV"));
        assert!(r.factors.contains(&("piCF", 0.1)));
    }

    #[test]
    fn unknown_rated_temperature_is_lookup_error() {
        let tables = HandbookTables::default();
        let mut i = ceramic();
        i.temperature_rated_max = 90.0;
        assert!(matches!(
            Capacitor.calculate(&i, &tables),
            Err(Error::LookupOutOfRange { index: 90, .. })
        ));
    }

    #[test]
    fn harsh_thresholds() {
        let tables = HandbookTables::default();
        let mut i = ceramic();
        i.voltage_dc_operating = 29.0;
        i.temperature_active = 80.0;
        let o = Capacitor.overstress(&i, &tables, true);
        assert_eq!(
            o.reasons,
            vec![
                "1. Operating voltage > 60% rated voltage.".to_string(),
                "2. Operating temperature within 10.0C of maximum rated temperature.".to_string(),
            ]
        );
        assert!(!Capacitor.overstress(&i, &tables, false).overstressed);
    }
}
