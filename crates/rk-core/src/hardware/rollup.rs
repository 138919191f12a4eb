//! Post-order hazard-rate rollup over a [`HardwareTree`].
//!
//! Parts get their active rate from the prediction library (or from a
//! specified rate or MTBF, per unit and multiplied by quantity). An assembly's active rate is the sum of its
//! children's active rates scaled by its own duty cycle, quantity and
//! adjustment factors, which are neutral by default.

use rk_common::{Error, NodeId, Result};
use serde::Serialize;

use super::tree::{FailureRateType, HardwareNode, HardwareTree, NodeOutputs};
use crate::context::CalculationContext;
use crate::degraded::{mtbf_from_rate, probability_or_one, ratio_or_zero};
use crate::log_event;
use crate::logging::{event_names, Stage};
use crate::prediction::predict;

/// Totals reported after a rollup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollupSummary {
    pub nodes: usize,
    pub predicted_parts: usize,
    pub overstressed_parts: usize,
    pub system_hazard_rate: f64,
    pub system_mtbf: f64,
}

/// `(sum + add) × duty/100 × mult × quantity`, with `add` converted from
/// per-10⁶-hour units.
fn scale_assembly(sum: f64, node: &HardwareNode, rate_multiplier: f64) -> f64 {
    let add = ratio_or_zero(node.add_adjustment, rate_multiplier, "add_adjustment");
    (sum + add) * (node.duty_cycle / 100.0) * node.mult_adjustment * node.quantity as f64
}

/// Specified per-unit rate times quantity.
fn specified_rate(node: &HardwareNode) -> f64 {
    let per_unit = match node.failure_rate_type {
        FailureRateType::SpecifiedMtbf => ratio_or_zero(1.0, node.specified_mtbf, "specified_mtbf"),
        _ => node.specified_hazard_rate,
    };
    per_unit * node.quantity as f64
}

/// Availability `MTBF/(MTBF + MTTR)`; 1.0 when the item never fails.
pub fn availability(mtbf: f64, mttr: f64) -> f64 {
    if mtbf > 0.0 {
        probability_or_one(mtbf / (mtbf + mttr), "availability")
    } else {
        probability_or_one(f64::NAN, "availability")
    }
}

fn check_rates(node: &HardwareNode, out: &NodeOutputs) -> Result<()> {
    for (field, v) in [
        ("failure_rate_active", out.failure_rate_active),
        ("failure_rate_dormant", out.failure_rate_dormant),
        ("failure_rate_software", out.failure_rate_software),
    ] {
        if !(v >= 0.0) {
            return Err(Error::invalid(
                field,
                format!("node {} has a negative or undefined rate {}", node.id, v),
            ));
        }
    }
    Ok(())
}

fn finish(node: &HardwareNode, out: &mut NodeOutputs) {
    out.failure_rate_predicted =
        out.failure_rate_active + out.failure_rate_dormant + out.failure_rate_software;
    out.failure_rate_mission = out.failure_rate_predicted;
    out.mtbf = mtbf_from_rate(out.failure_rate_predicted);
    out.reliability = probability_or_one(
        (-out.failure_rate_predicted * node.mission_time).exp(),
        "reliability",
    );
    out.availability = availability(out.mtbf, node.mttr);
}

/// Outputs for a leaf node.
fn leaf_outputs(node: &HardwareNode, ctx: &CalculationContext) -> Result<NodeOutputs> {
    let mut out = NodeOutputs {
        failure_rate_dormant: node.failure_rate_dormant,
        failure_rate_software: node.failure_rate_software,
        total_cost: node.cost * node.quantity as f64,
        part_count: node.quantity,
        ..NodeOutputs::default()
    };
    match (node.failure_rate_type, &node.part) {
        (FailureRateType::Assessed, Some(part)) => {
            let mut inputs = part.clone();
            inputs.quantity = node.quantity;
            inputs.duty_cycle = node.duty_cycle;
            inputs.add_adjustment = node.add_adjustment;
            inputs.mult_adjustment = node.mult_adjustment;
            inputs.environment_active = node.environment_active;
            inputs.temperature_active = node.temperature_active;
            let prediction = predict(&inputs, ctx)?;
            out.failure_rate_active = prediction.hazard_rate_active;
            out.prediction = Some(prediction);
        }
        (FailureRateType::Assessed, None) => {
            // an assessed leaf with no part data contributes only its adjustment
            out.failure_rate_active = scale_assembly(0.0, node, ctx.rate_multiplier());
        }
        _ => out.failure_rate_active = specified_rate(node),
    }
    Ok(out)
}

/// Outputs for an assembly from its already-rolled-up children.
fn assembly_outputs(tree: &HardwareTree, id: NodeId, ctx: &CalculationContext) -> Result<NodeOutputs> {
    let node = tree.get(id)?;
    let mut active = 0.0;
    let mut dormant = 0.0;
    let mut software = node.failure_rate_software;
    let mut cost = node.cost;
    let mut parts = 0u32;
    for child in tree.children(id) {
        let c = &tree.get(*child)?.outputs;
        active += c.failure_rate_active;
        dormant += c.failure_rate_dormant;
        software += c.failure_rate_software;
        cost += c.total_cost;
        parts = parts.saturating_add(c.part_count);
    }
    let failure_rate_active = match node.failure_rate_type {
        FailureRateType::Assessed => scale_assembly(active, node, ctx.rate_multiplier()),
        _ => specified_rate(node),
    };
    Ok(NodeOutputs {
        failure_rate_active,
        failure_rate_dormant: dormant + node.failure_rate_dormant,
        failure_rate_software: software,
        total_cost: cost * node.quantity as f64,
        part_count: parts.saturating_mul(node.quantity),
        ..NodeOutputs::default()
    })
}

/// Predict every part and roll rates, cost and part count up to the root.
///
/// Outputs are overwritten; running twice gives the same result. On error
/// the tree may hold a partial rollup and should be recomputed.
pub fn rollup(tree: &mut HardwareTree, ctx: &CalculationContext) -> Result<RollupSummary> {
    let mut predicted_parts = 0;
    let mut overstressed_parts = 0;

    for id in tree.post_order() {
        let mut out = if tree.is_leaf(id) {
            leaf_outputs(tree.get(id)?, ctx)?
        } else {
            assembly_outputs(tree, id, ctx)?
        };
        let node = tree.get(id)?;
        check_rates(node, &out)?;
        finish(node, &mut out);
        if let Some(p) = &out.prediction {
            predicted_parts += 1;
            if p.overstress {
                overstressed_parts += 1;
            }
        }
        tree.get_mut(id)?.outputs = out;
    }

    let root = &tree.get(tree.root())?.outputs;
    let summary = RollupSummary {
        nodes: tree.len(),
        predicted_parts,
        overstressed_parts,
        system_hazard_rate: root.failure_rate_predicted,
        system_mtbf: root.mtbf,
    };
    log_event!(
        ctx.log,
        INFO,
        event_names::ROLLUP_FINISHED,
        Stage::Rollup,
        "hardware rollup finished",
        nodes = summary.nodes,
        parts = predicted_parts,
        overstressed = overstressed_parts,
        hazard_rate = summary.system_hazard_rate
    );
    Ok(summary)
}
