//! Reliability allocation over the immediate children of one assembly.
//!
//! A system goal (reliability, MTBF or hazard rate over the operating time
//! `Ts`) is apportioned to the included children by one of four methods.
//! Only one indenture level is handled per call.

use rk_common::{Error, NodeId, Result};
use serde::{Deserialize, Serialize};

use crate::context::CalculationContext;
use crate::degraded::{mtbf_from_rate, probability_or_one, ratio_or_zero};
use crate::hardware::{availability, HardwareTree};
use crate::log_event;
use crate::logging::{event_names, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    #[default]
    Equal,
    Agree,
    Arinc,
    Feasibility,
}

impl AllocationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            AllocationMethod::Equal => "equal",
            AllocationMethod::Agree => "agree",
            AllocationMethod::Arinc => "arinc",
            AllocationMethod::Feasibility => "feasibility",
        }
    }
}

/// The one goal supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Reliability(f64),
    Mtbf(f64),
    HazardRate(f64),
}

/// A goal in all three forms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalValues {
    pub reliability: f64,
    pub mtbf: f64,
    pub hazard_rate: f64,
}

impl Goal {
    /// Back-derive the other two forms over operating time `ts`.
    pub fn resolve(self, ts: f64) -> Result<GoalValues> {
        if !(ts > 0.0) {
            return Err(Error::invalid("operating_time", "must be positive"));
        }
        let values = match self {
            Goal::Reliability(r) => {
                if !(r > 0.0 && r < 1.0) {
                    return Err(Error::invalid("goal.reliability", "must be in (0, 1)"));
                }
                let mtbf = -ts / r.ln();
                GoalValues {
                    reliability: r,
                    mtbf,
                    hazard_rate: 1.0 / mtbf,
                }
            }
            Goal::Mtbf(mtbf) => {
                if !(mtbf > 0.0) {
                    return Err(Error::invalid("goal.mtbf", "must be positive"));
                }
                GoalValues {
                    reliability: (-ts / mtbf).exp(),
                    mtbf,
                    hazard_rate: 1.0 / mtbf,
                }
            }
            Goal::HazardRate(rate) => {
                if !(rate > 0.0) {
                    return Err(Error::invalid("goal.hazard_rate", "must be positive"));
                }
                GoalValues {
                    reliability: (-rate * ts).exp(),
                    mtbf: 1.0 / rate,
                    hazard_rate: rate,
                }
            }
        };
        Ok(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationOutputs {
    pub weight: f64,
    pub percent_weight: f64,
    pub hazard_rate: f64,
    pub mtbf: f64,
    pub reliability: f64,
    pub availability: f64,
}

/// One child of the assembly under allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationNode {
    pub id: NodeId,
    pub name: String,
    pub included: bool,
    /// AGREE `n`.
    pub n_sub_systems: u32,
    /// AGREE `ni`.
    pub n_sub_elements: u32,
    pub duty_cycle: f64,
    /// AGREE importance weight `wi`, in (0, 1].
    pub weight: f64,
    pub int_factor: u32,
    pub soa_factor: u32,
    pub op_time_factor: u32,
    pub env_factor: u32,
    /// Current predicted hazard rate, used by ARINC.
    pub current_hazard_rate: f64,
    pub mttr: Option<f64>,
    pub outputs: AllocationOutputs,
}

impl Default for AllocationNode {
    fn default() -> Self {
        Self {
            id: NodeId(0),
            name: String::new(),
            included: true,
            n_sub_systems: 1,
            n_sub_elements: 1,
            duty_cycle: 100.0,
            weight: 1.0,
            int_factor: 1,
            soa_factor: 1,
            op_time_factor: 1,
            env_factor: 1,
            current_hazard_rate: 0.0,
            mttr: None,
            outputs: AllocationOutputs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub method: AllocationMethod,
    /// System operating time `Ts`, hours.
    pub operating_time: f64,
    pub goal: Goal,
    pub nodes: Vec<AllocationNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub method: AllocationMethod,
    pub goal: GoalValues,
    pub nodes: Vec<AllocationNode>,
}

/// Allocation nodes for the children of `parent`, carrying their rolled-up
/// rates, duty cycles and repair times.
pub fn nodes_from_tree(tree: &HardwareTree, parent: NodeId) -> Result<Vec<AllocationNode>> {
    tree.get(parent)?;
    tree.children(parent)
        .iter()
        .map(|id| {
            let node = tree.get(*id)?;
            Ok(AllocationNode {
                id: node.id,
                name: node.name.clone(),
                duty_cycle: node.duty_cycle,
                current_hazard_rate: node.outputs.failure_rate_predicted,
                mttr: (node.mttr > 0.0).then_some(node.mttr),
                ..AllocationNode::default()
            })
        })
        .collect()
}

fn check_factor(node: &AllocationNode, field: &str, value: u32) -> Result<()> {
    if (1..=10).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid(
            field,
            format!("node {} factor {} is outside 1..=10", node.id, value),
        ))
    }
}

fn validate(method: AllocationMethod, node: &AllocationNode) -> Result<()> {
    match method {
        AllocationMethod::Equal => {}
        AllocationMethod::Agree => {
            if !(0.0..=100.0).contains(&node.duty_cycle) {
                return Err(Error::invalid("duty_cycle", "must be within 0..=100"));
            }
            if !(node.weight > 0.0 && node.weight <= 1.0) {
                return Err(Error::invalid("weight", "AGREE importance must be in (0, 1]"));
            }
            if node.n_sub_systems == 0 || node.n_sub_elements == 0 {
                return Err(Error::invalid("n_sub_elements", "AGREE counts must be at least 1"));
            }
        }
        AllocationMethod::Arinc => {
            if !(node.current_hazard_rate >= 0.0) {
                return Err(Error::invalid("current_hazard_rate", "must be non-negative"));
            }
        }
        AllocationMethod::Feasibility => {
            check_factor(node, "int_factor", node.int_factor)?;
            check_factor(node, "soa_factor", node.soa_factor)?;
            check_factor(node, "op_time_factor", node.op_time_factor)?;
            check_factor(node, "env_factor", node.env_factor)?;
        }
    }
    Ok(())
}

/// `(weight, hazard rate)` for each included node.
fn apportion(
    method: AllocationMethod,
    nodes: &[&AllocationNode],
    goal: &GoalValues,
    ts: f64,
) -> Result<Vec<(f64, f64)>> {
    let n = nodes.len() as f64;
    let shares = match method {
        AllocationMethod::Equal => {
            let w = 1.0 / n;
            let r_i = goal.reliability.powf(w);
            vec![(w, -r_i.ln() / ts); nodes.len()]
        }
        AllocationMethod::Agree => {
            let rates: Vec<f64> = nodes
                .iter()
                .map(|node| {
                    let t_i = ts * node.duty_cycle / 100.0;
                    let mtbf = (node.n_sub_systems as f64 * node.weight * t_i)
                        / (-(node.n_sub_elements as f64) * goal.reliability.ln());
                    ratio_or_zero(1.0, mtbf, "agree.hazard_rate")
                })
                .collect();
            let total: f64 = rates.iter().sum();
            rates
                .into_iter()
                .map(|rate| (ratio_or_zero(rate, total, "agree.weight"), rate))
                .collect()
        }
        AllocationMethod::Arinc => {
            let total: f64 = nodes.iter().map(|n| n.current_hazard_rate).sum();
            if total <= 0.0 {
                return Err(Error::InsufficientData(
                    "ARINC allocation needs a positive current hazard rate".to_string(),
                ));
            }
            nodes
                .iter()
                .map(|node| {
                    let w = node.current_hazard_rate / total;
                    (w, w * goal.hazard_rate)
                })
                .collect()
        }
        AllocationMethod::Feasibility => {
            let products: Vec<f64> = nodes
                .iter()
                .map(|n| (n.int_factor * n.soa_factor * n.op_time_factor * n.env_factor) as f64)
                .collect();
            let total: f64 = products.iter().sum();
            products
                .into_iter()
                .map(|w| {
                    let c = w / total;
                    (c, c * goal.hazard_rate)
                })
                .collect()
        }
    };
    Ok(shares)
}

/// Apportion the goal among the included nodes, overwriting their outputs.
///
/// Excluded nodes are reset to zero outputs.
pub fn allocate(request: AllocationRequest, ctx: &CalculationContext) -> Result<AllocationResult> {
    let AllocationRequest {
        method,
        operating_time: ts,
        goal,
        mut nodes,
    } = request;
    let goal = goal.resolve(ts)?;

    let included: Vec<&AllocationNode> = nodes.iter().filter(|n| n.included).collect();
    if included.is_empty() {
        return Err(Error::InsufficientData(
            "allocation needs at least one included node".to_string(),
        ));
    }
    for node in &included {
        validate(method, node)?;
    }
    let mut shares = apportion(method, &included, &goal, ts)?.into_iter();

    for node in nodes.iter_mut() {
        node.outputs = AllocationOutputs::default();
        if !node.included {
            continue;
        }
        let Some((weight, hazard_rate)) = shares.next() else {
            break;
        };
        let mtbf = mtbf_from_rate(hazard_rate);
        node.outputs = AllocationOutputs {
            weight,
            percent_weight: weight * 100.0,
            hazard_rate,
            mtbf,
            reliability: probability_or_one((-hazard_rate * ts).exp(), "allocation.reliability"),
            availability: availability(mtbf, node.mttr.unwrap_or(0.0)),
        };
    }

    log_event!(
        ctx.log,
        INFO,
        event_names::ALLOCATION_FINISHED,
        Stage::Allocation,
        "allocation finished",
        method = method.as_str(),
        nodes = nodes.len(),
        goal_hazard_rate = goal.hazard_rate
    );
    Ok(AllocationResult {
        method,
        goal,
        nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{rollup, FailureRateType, HardwareNode};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1e-12)
    }

    fn node(id: u32) -> AllocationNode {
        AllocationNode {
            id: NodeId(id),
            name: format!("sub-{id}"),
            ..AllocationNode::default()
        }
    }

    fn request(method: AllocationMethod, goal: Goal, nodes: Vec<AllocationNode>) -> AllocationRequest {
        AllocationRequest {
            method,
            operating_time: 100.0,
            goal,
            nodes,
        }
    }

    // ========================================================================
    // Goal forms
    // ========================================================================

    #[test]
    fn goal_forms_agree() {
        let from_r = Goal::Reliability(0.95).resolve(100.0).unwrap();
        assert!(approx_eq(from_r.mtbf, -100.0 / 0.95f64.ln()));
        let from_mtbf = Goal::Mtbf(from_r.mtbf).resolve(100.0).unwrap();
        assert!(approx_eq(from_mtbf.reliability, 0.95));
        let from_rate = Goal::HazardRate(from_r.hazard_rate).resolve(100.0).unwrap();
        assert!(approx_eq(from_rate.reliability, 0.95));
    }

    #[test]
    fn goal_out_of_range() {
        assert!(Goal::Reliability(1.0).resolve(100.0).is_err());
        assert!(Goal::Mtbf(0.0).resolve(100.0).is_err());
        assert!(Goal::HazardRate(1e-3).resolve(0.0).is_err());
    }

    // ========================================================================
    // Methods
    // ========================================================================

    #[test]
    fn equal_product_meets_goal() {
        let r = allocate(
            request(AllocationMethod::Equal, Goal::Reliability(0.9), vec![node(1), node(2), node(3)]),
            &CalculationContext::default(),
        )
        .unwrap();
        let product: f64 = r.nodes.iter().map(|n| n.outputs.reliability).product();
        assert!(approx_eq(product, 0.9));
        assert!(approx_eq(r.nodes[0].outputs.percent_weight, 100.0 / 3.0));
    }

    #[test]
    fn excluded_nodes_are_skipped() {
        let mut skipped = node(2);
        skipped.included = false;
        skipped.outputs.hazard_rate = 9.0;
        let r = allocate(
            request(AllocationMethod::Equal, Goal::Reliability(0.9), vec![node(1), skipped]),
            &CalculationContext::default(),
        )
        .unwrap();
        assert!(approx_eq(r.nodes[0].outputs.reliability, 0.9));
        assert_eq!(r.nodes[1].outputs, AllocationOutputs::default());
    }

    #[test]
    fn arinc_sums_to_goal() {
        let mut a = node(1);
        a.current_hazard_rate = 1.0e-4;
        let mut b = node(2);
        b.current_hazard_rate = 3.0e-4;
        let r = allocate(
            request(AllocationMethod::Arinc, Goal::HazardRate(2.0e-4), vec![a, b]),
            &CalculationContext::default(),
        )
        .unwrap();
        let total: f64 = r.nodes.iter().map(|n| n.outputs.hazard_rate).sum();
        assert!(approx_eq(total, 2.0e-4));
        assert!(approx_eq(r.nodes[0].outputs.weight, 0.25));
    }

    #[test]
    fn arinc_without_current_rates_is_input_error() {
        let err = allocate(
            request(AllocationMethod::Arinc, Goal::HazardRate(2.0e-4), vec![node(1)]),
            &CalculationContext::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn agree_formula() {
        let mut a = node(1);
        a.n_sub_systems = 2;
        a.n_sub_elements = 3;
        a.weight = 0.9;
        a.duty_cycle = 50.0;
        let r = allocate(
            request(AllocationMethod::Agree, Goal::Reliability(0.95), vec![a, node(2)]),
            &CalculationContext::default(),
        )
        .unwrap();
        let mtbf = (2.0 * 0.9 * 50.0) / (-3.0 * 0.95f64.ln());
        assert!(approx_eq(r.nodes[0].outputs.mtbf, mtbf));
        assert!(approx_eq(r.nodes[0].outputs.reliability, (-100.0 / mtbf).exp()));
        let weights: f64 = r.nodes.iter().map(|n| n.outputs.weight).sum();
        assert!(approx_eq(weights, 1.0));
    }

    #[test]
    fn feasibility_weights_by_factor_product() {
        let mut a = node(1);
        a.int_factor = 5;
        a.soa_factor = 2;
        let mut b = node(2);
        b.env_factor = 10;
        let r = allocate(
            request(AllocationMethod::Feasibility, Goal::HazardRate(1.0e-3), vec![a, b]),
            &CalculationContext::default(),
        )
        .unwrap();
        assert!(approx_eq(r.nodes[0].outputs.weight, 0.5));
        assert!(approx_eq(r.nodes[1].outputs.hazard_rate, 0.5e-3));
    }

    #[test]
    fn feasibility_factor_out_of_range() {
        let mut a = node(1);
        a.soa_factor = 11;
        assert!(matches!(
            allocate(
                request(AllocationMethod::Feasibility, Goal::HazardRate(1.0e-3), vec![a]),
                &CalculationContext::default(),
            ),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn availability_uses_repair_time() {
        let mut a = node(1);
        a.mttr = Some(10.0);
        let r = allocate(
            request(AllocationMethod::Equal, Goal::Mtbf(1000.0), vec![a]),
            &CalculationContext::default(),
        )
        .unwrap();
        let out = r.nodes[0].outputs;
        assert!(approx_eq(out.availability, out.mtbf / (out.mtbf + 10.0)));
    }

    #[test]
    fn nodes_built_from_rolled_up_children() {
        let mut tree = HardwareTree::from_nodes(vec![
            HardwareNode::new(1, None, "system"),
            HardwareNode {
                failure_rate_type: FailureRateType::SpecifiedHazardRate,
                specified_hazard_rate: 4.0e-5,
                mttr: 3.0,
                ..HardwareNode::new(2, Some(1), "power")
            },
        ])
        .unwrap();
        rollup(&mut tree, &CalculationContext::default()).unwrap();
        let nodes = nodes_from_tree(&tree, NodeId(1)).unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(approx_eq(nodes[0].current_hazard_rate, 4.0e-5));
        assert_eq!(nodes[0].mttr, Some(3.0));
        assert!(nodes_from_tree(&tree, NodeId(7)).is_err());
    }
}
