//! Component hazard-rate prediction (MIL-HDBK-217F parts-count and
//! part-stress models).
//!
//! Each supported category implements [`HazardRateModel`]. [`predict`]
//! resolves the category from the part's ids, runs the model, scales the
//! model rate into an active hazard rate and runs the overstress checks.

pub mod capacitor;
pub mod connection;
pub mod meter;
pub mod optoelectronic;
pub mod relay;

use rk_common::{Error, Result};
use rk_config::{HandbookTables, ENVIRONMENT_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::context::CalculationContext;
use crate::degraded::ratio_or_zero;
use crate::log_event;
use crate::logging::{event_names, Stage};

/// Hardware category ids understood by the prediction library.
pub mod category_ids {
    pub const SEMICONDUCTOR: u32 = 2;
    pub const CAPACITOR: u32 = 4;
    pub const RELAY: u32 = 6;
    pub const CONNECTION: u32 = 8;
    pub const METER: u32 = 9;

    /// Semiconductor subcategory of optoelectronic detectors.
    pub const OPTOELECTRONIC_DETECTOR: u32 = 11;
    /// Relay subcategory of solid-state and time-delay relays.
    pub const SOLID_STATE_RELAY: u32 = 2;
}

/// Parts-count (method 1) or part-stress (method 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    PartsCount,
    #[default]
    PartStress,
}

/// The closed set of modelled component categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCategory {
    Capacitor,
    Connection,
    Relay,
    Meter,
    Optoelectronic,
}

impl PartCategory {
    /// Resolve a category/subcategory id pair.
    pub fn from_ids(category: u32, subcategory: u32) -> Result<Self> {
        use category_ids::*;
        let found = match (category, subcategory) {
            (CAPACITOR, 1..=19) => Some(PartCategory::Capacitor),
            (CONNECTION, 1..=5) => Some(PartCategory::Connection),
            (RELAY, SOLID_STATE_RELAY) => Some(PartCategory::Relay),
            (METER, 1 | 2) => Some(PartCategory::Meter),
            (SEMICONDUCTOR, OPTOELECTRONIC_DETECTOR) => Some(PartCategory::Optoelectronic),
            _ => None,
        };
        found.ok_or(Error::UnsupportedCategory {
            category,
            subcategory,
        })
    }

    /// The model implementing this category.
    pub fn model(self) -> &'static dyn HazardRateModel {
        match self {
            PartCategory::Capacitor => &capacitor::Capacitor,
            PartCategory::Connection => &connection::Connection,
            PartCategory::Relay => &relay::SolidStateRelay,
            PartCategory::Meter => &meter::Meter,
            PartCategory::Optoelectronic => &optoelectronic::Detector,
        }
    }
}

impl fmt::Display for PartCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PartCategory::Capacitor => "capacitor",
            PartCategory::Connection => "connection",
            PartCategory::Relay => "relay",
            PartCategory::Meter => "meter",
            PartCategory::Optoelectronic => "optoelectronic",
        };
        write!(f, "{}", s)
    }
}

/// Everything a hazard-rate model may read about one part.
///
/// Ids are 1-based as in the handbook tables. Fields a category does not
/// use are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartInputs {
    pub category_id: u32,
    pub subcategory_id: u32,
    pub method: PredictionMethod,
    pub environment_active: u32,
    pub quality_id: u32,

    pub type_id: u32,
    pub specification_id: u32,
    pub insert_id: u32,
    pub construction_id: u32,
    pub configuration_id: u32,
    pub application_id: u32,
    pub function_id: u32,

    // Connections
    pub contact_gauge: u32,
    pub n_active_pins: u32,
    /// Mate/unmate cycles per 1000 hours.
    pub n_cycles: f64,
    pub n_wave_soldered: u32,
    pub n_hand_soldered: u32,
    pub n_circuit_planes: u32,

    // Temperatures, °C
    pub temperature_active: f64,
    pub temperature_junction: f64,
    pub temperature_rated_max: f64,

    // Electrical stress
    pub voltage_rated: f64,
    pub voltage_dc_operating: f64,
    pub voltage_ac_operating: f64,
    pub current_rated: f64,
    pub current_operating: f64,
    pub power_rated: f64,
    pub power_operating: f64,
    /// Capacitance, µF.
    pub capacitance: f64,
    /// Effective series resistance, Ω.
    pub resistance: f64,

    // Active-rate scaling
    pub quantity: u32,
    /// Duty cycle, percent.
    pub duty_cycle: f64,
    pub add_adjustment: f64,
    pub mult_adjustment: f64,
}

impl Default for PartInputs {
    fn default() -> Self {
        Self {
            category_id: 0,
            subcategory_id: 0,
            method: PredictionMethod::default(),
            environment_active: 1,
            quality_id: 1,
            type_id: 1,
            specification_id: 1,
            insert_id: 1,
            construction_id: 1,
            configuration_id: 1,
            application_id: 1,
            function_id: 1,
            contact_gauge: 0,
            n_active_pins: 1,
            n_cycles: 0.0,
            n_wave_soldered: 0,
            n_hand_soldered: 0,
            n_circuit_planes: 0,
            temperature_active: 30.0,
            temperature_junction: 30.0,
            temperature_rated_max: 85.0,
            voltage_rated: 0.0,
            voltage_dc_operating: 0.0,
            voltage_ac_operating: 0.0,
            current_rated: 0.0,
            current_operating: 0.0,
            power_rated: 0.0,
            power_operating: 0.0,
            capacitance: 0.0,
            resistance: 0.0,
            quantity: 1,
            duty_cycle: 100.0,
            add_adjustment: 0.0,
            mult_adjustment: 1.0,
        }
    }
}

impl PartInputs {
    pub fn new(category_id: u32, subcategory_id: u32, method: PredictionMethod) -> Self {
        Self {
            category_id,
            subcategory_id,
            method,
            ..Self::default()
        }
    }
}

/// Operating-to-rated stress ratios.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OperatingRatios {
    pub current: f64,
    pub voltage: f64,
    pub power: f64,
}

impl OperatingRatios {
    /// Ratios from the part's operating and rated values. `voltage` is the
    /// operating voltage to compare against the rating.
    pub fn from_inputs(inputs: &PartInputs, voltage: f64) -> Self {
        Self {
            current: ratio_or_zero(inputs.current_operating, inputs.current_rated, "current_ratio"),
            voltage: ratio_or_zero(voltage, inputs.voltage_rated, "voltage_ratio"),
            power: ratio_or_zero(inputs.power_operating, inputs.power_rated, "power_ratio"),
        }
    }
}

/// A model rate with the factors that produced it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelRate {
    /// λp in failures per 10⁶ hours.
    pub rate: f64,
    /// Named factors (`lambda_b`, `piQ`, `piE`, …) in evaluation order.
    pub factors: Vec<(&'static str, f64)>,
}

impl ModelRate {
    pub fn factor(mut self, name: &'static str, value: f64) -> Self {
        self.factors.push((name, value));
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }
}

/// Accumulated overstress verdict.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Overstress {
    pub overstressed: bool,
    /// Numbered reasons, in check order.
    pub reasons: Vec<String>,
}

impl Overstress {
    /// Record a violation.
    pub fn flag(&mut self, reason: &str) {
        self.overstressed = true;
        let n = self.reasons.len() + 1;
        self.reasons.push(format!("{}. {}", n, reason));
    }

    /// Flag when `operating` exceeds `limit` of `rated`.
    pub fn check_limit(&mut self, operating: f64, rated: f64, limit: f64, what: &str) {
        if operating > limit * rated {
            self.flag(&format!(
                "Operating {what} > {:.0}% rated {what}.",
                limit * 100.0
            ));
        }
    }
}

/// Common contract of every category model.
pub trait HazardRateModel {
    fn category(&self) -> PartCategory;

    /// Model rate λp (per 10⁶ h) before duty cycle, quantity and
    /// adjustment factors.
    fn calculate(&self, inputs: &PartInputs, tables: &HandbookTables) -> Result<ModelRate>;

    /// Overstress checks for a harsh or benign active environment.
    fn overstress(&self, inputs: &PartInputs, tables: &HandbookTables, harsh: bool) -> Overstress;

    /// Operating ratios reported with the prediction.
    fn ratios(&self, inputs: &PartInputs) -> OperatingRatios {
        OperatingRatios::from_inputs(inputs, inputs.voltage_dc_operating)
    }
}

/// Result of one part prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub category: PartCategory,
    pub method: PredictionMethod,
    /// λp per 10⁶ hours.
    pub model_rate: f64,
    /// Active hazard rate after scaling, per hour at the default multiplier.
    pub hazard_rate_active: f64,
    pub factors: BTreeMap<String, f64>,
    pub overstress: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    pub ratios: OperatingRatios,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// `(model + add) × duty/100 × mult × quantity / multiplier`.
pub fn active_hazard_rate(model_rate: f64, inputs: &PartInputs, rate_multiplier: f64) -> f64 {
    let scaled = (model_rate + inputs.add_adjustment)
        * (inputs.duty_cycle / 100.0)
        * inputs.mult_adjustment
        * inputs.quantity as f64;
    ratio_or_zero(scaled, rate_multiplier, "hazard_rate_active")
}

fn factor_label(name: &str) -> &str {
    match name {
        "lambda_b" => "Base hazard rate",
        other => other,
    }
}

/// Warnings for every non-positive base rate or π-factor.
pub fn check_variables(category: PartCategory, inputs: &PartInputs, rate: &ModelRate) -> Vec<String> {
    rate.factors
        .iter()
        .filter(|(_, v)| !(*v > 0.0))
        .map(|(name, v)| {
            format!(
                "{} is {} when calculating {} subcategory {}.",
                factor_label(name),
                v,
                category,
                inputs.subcategory_id
            )
        })
        .collect()
}

fn validate(inputs: &PartInputs) -> Result<()> {
    if inputs.environment_active == 0 || inputs.environment_active as usize > ENVIRONMENT_COUNT {
        return Err(Error::lookup("environment", inputs.environment_active));
    }
    if !(0.0..=100.0).contains(&inputs.duty_cycle) {
        return Err(Error::invalid(
            "duty_cycle",
            format!("must be within 0-100 percent, got {}", inputs.duty_cycle),
        ));
    }
    if !(inputs.mult_adjustment >= 0.0) {
        return Err(Error::invalid("mult_adjustment", "must be non-negative"));
    }
    Ok(())
}

/// Predict the active hazard rate of one part.
pub fn predict(inputs: &PartInputs, ctx: &CalculationContext) -> Result<PredictionResult> {
    validate(inputs)?;
    let category = PartCategory::from_ids(inputs.category_id, inputs.subcategory_id)?;
    let model = category.model();
    let name = category.to_string();

    let rate = model.calculate(inputs, ctx.tables())?;
    let hazard_rate_active = active_hazard_rate(rate.rate, inputs, ctx.rate_multiplier());

    let harsh = ctx.config.prediction.is_harsh(inputs.environment_active);
    let stress = model.overstress(inputs, ctx.tables(), harsh);
    if stress.overstressed {
        log_event!(
            ctx.log,
            WARN,
            event_names::PREDICTION_OVERSTRESS,
            Stage::Prediction,
            "part overstressed",
            category = name.as_str(),
            reasons = stress.reasons.len(),
            harsh = harsh
        );
    }

    let warnings = check_variables(category, inputs, &rate);
    for w in &warnings {
        log_event!(
            ctx.log,
            WARN,
            event_names::PREDICTION_CHECK,
            Stage::Prediction,
            w.as_str(),
            category = name.as_str()
        );
    }

    log_event!(
        ctx.log,
        DEBUG,
        event_names::PREDICTION_FINISHED,
        Stage::Prediction,
        "part prediction finished",
        category = name.as_str(),
        subcategory = inputs.subcategory_id,
        model_rate = rate.rate,
        hazard_rate_active = hazard_rate_active
    );

    Ok(PredictionResult {
        category,
        method: inputs.method,
        model_rate: rate.rate,
        hazard_rate_active,
        factors: rate
            .factors
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect(),
        overstress: stress.overstressed,
        reasons: stress.reasons,
        ratios: model.ratios(inputs),
        warnings,
    })
}

// ============================================================================
// Table access
// ============================================================================

/// Entry `id` (1-based) of a factor list.
pub(crate) fn entry(table: &str, list: &[f64], id: u32) -> Result<f64> {
    id.checked_sub(1)
        .and_then(|i| list.get(i as usize))
        .copied()
        .ok_or_else(|| Error::lookup(table, id))
}

/// Row `id` (1-based) of a table of rows.
pub(crate) fn row<'a>(table: &str, rows: &'a [Vec<f64>], id: u32) -> Result<&'a [f64]> {
    id.checked_sub(1)
        .and_then(|i| rows.get(i as usize))
        .map(Vec::as_slice)
        .ok_or_else(|| Error::lookup(table, id))
}

/// Value under `key` in a keyed table.
pub(crate) fn keyed<'a, T>(table: &str, map: &'a BTreeMap<u32, T>, key: u32) -> Result<&'a T> {
    map.get(&key).ok_or_else(|| Error::lookup(table, key))
}

/// The active-environment entry of an environment row.
pub(crate) fn environment(table: &str, list: &[f64], inputs: &PartInputs) -> Result<f64> {
    entry(table, list, inputs.environment_active)
}
