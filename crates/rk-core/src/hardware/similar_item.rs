//! Similar-item analysis with user-defined functions.
//!
//! Up to five functions are evaluated in order. Function `k` may read the
//! node hazard rate `hr`, the factors `pi1..pi8`, the user values
//! `uf1..uf3`/`ui1..ui3`, and the results `res1..res(k-1)` of the functions
//! before it.

use rk_common::{Error, Result};
use serde::{Deserialize, Serialize};

use super::tree::HardwareNode;
use crate::context::CalculationContext;
use crate::expr::{Expression, Variables};
use crate::log_event;
use crate::logging::{event_names, Stage};

pub const MAX_FUNCTIONS: usize = 5;
pub const MAX_FACTORS: usize = 8;
pub const MAX_USER_VALUES: usize = 3;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarItemInputs {
    /// Hazard rate of the item being compared, bound to `hr`.
    pub hazard_rate: f64,
    /// `pi1..pi8`.
    pub factors: Vec<f64>,
    /// `uf1..uf3`.
    pub user_floats: Vec<f64>,
    /// `ui1..ui3`.
    pub user_ints: Vec<i64>,
    /// Function sources; a blank entry yields 0.0.
    pub functions: Vec<String>,
}

impl SimilarItemInputs {
    /// Inputs bound to a rolled-up node's predicted rate.
    pub fn for_node(node: &HardwareNode, functions: Vec<String>) -> Self {
        Self {
            hazard_rate: node.outputs.failure_rate_predicted,
            functions,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarItemResult {
    /// `res1..resN`, one per function.
    pub results: Vec<f64>,
}

fn check_len(field: &str, len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(Error::invalid(field, format!("at most {} allowed, got {}", max, len)));
    }
    Ok(())
}

/// `res` index referenced by a variable name, if any.
fn result_index(name: &str) -> Option<usize> {
    name.strip_prefix("res").and_then(|n| n.parse().ok())
}

/// Parse every function, rejecting forward references to results.
fn compile(functions: &[String]) -> Result<Vec<Option<Expression>>> {
    functions
        .iter()
        .enumerate()
        .map(|(i, src)| {
            if src.trim().is_empty() {
                return Ok(None);
            }
            let expr = Expression::parse(src)?;
            if let Some(bad) = expr
                .variables()
                .into_iter()
                .find(|v| result_index(v).is_some_and(|k| k > i))
            {
                return Err(Error::Expression(format!(
                    "function {} reads {} before it is computed",
                    i + 1,
                    bad
                )));
            }
            Ok(Some(expr))
        })
        .collect()
}

/// Evaluate the user functions in order.
pub fn similar_item(inputs: &SimilarItemInputs, ctx: &CalculationContext) -> Result<SimilarItemResult> {
    check_len("functions", inputs.functions.len(), MAX_FUNCTIONS)?;
    check_len("factors", inputs.factors.len(), MAX_FACTORS)?;
    check_len("user_floats", inputs.user_floats.len(), MAX_USER_VALUES)?;
    check_len("user_ints", inputs.user_ints.len(), MAX_USER_VALUES)?;

    let compiled = compile(&inputs.functions)?;

    let mut vars = Variables::new();
    vars.set("hr", inputs.hazard_rate);
    for (i, v) in inputs.factors.iter().enumerate() {
        vars.set(format!("pi{}", i + 1), *v);
    }
    for (i, v) in inputs.user_floats.iter().enumerate() {
        vars.set(format!("uf{}", i + 1), *v);
    }
    for (i, v) in inputs.user_ints.iter().enumerate() {
        vars.set(format!("ui{}", i + 1), *v as f64);
    }

    let mut results = Vec::with_capacity(compiled.len());
    for (i, expr) in compiled.iter().enumerate() {
        let value = match expr {
            Some(e) => e.evaluate(&vars)?,
            None => 0.0,
        };
        vars.set(format!("res{}", i + 1), value);
        results.push(value);
    }

    log_event!(
        ctx.log,
        INFO,
        event_names::ROLLUP_FINISHED,
        Stage::Rollup,
        "similar-item functions evaluated",
        functions = results.len(),
        hazard_rate = inputs.hazard_rate
    );
    Ok(SimilarItemResult { results })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(functions: &[&str]) -> SimilarItemInputs {
        SimilarItemInputs {
            hazard_rate: 2.0e-6,
            factors: vec![1.5, 0.8],
            user_floats: vec![10.0],
            user_ints: vec![3],
            functions: functions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn functions_chain_through_results() {
        let res = similar_item(
            &inputs(&["hr * pi1 * pi2", "res1 * ui1", "", "res2 + uf1"]),
            &CalculationContext::default(),
        )
        .unwrap();
        assert_eq!(res.results.len(), 4);
        assert!((res.results[0] - 2.4e-6).abs() < 1e-18);
        assert!((res.results[1] - 7.2e-6).abs() < 1e-18);
        assert_eq!(res.results[2], 0.0);
        assert!((res.results[3] - (7.2e-6 + 10.0)).abs() < 1e-12);
    }

    #[test]
    fn forward_reference_is_rejected() {
        let err = similar_item(&inputs(&["res2 * 2", "hr"]), &CalculationContext::default())
            .unwrap_err();
        assert!(matches!(err, Error::Expression(_)));
        let err = similar_item(&inputs(&["res1"]), &CalculationContext::default()).unwrap_err();
        assert!(matches!(err, Error::Expression(_)));
    }

    #[test]
    fn too_many_functions() {
        let err = similar_item(&inputs(&["hr"; 6]), &CalculationContext::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[test]
    fn unknown_variable_is_expression_error() {
        let err = similar_item(&inputs(&["hr * pi9"]), &CalculationContext::default()).unwrap_err();
        assert!(matches!(err, Error::Expression(_)));
    }

    #[test]
    fn deeply_nested_function_is_expression_error() {
        let deep = format!("{}hr{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = similar_item(&inputs(&[deep.as_str()]), &CalculationContext::default())
            .unwrap_err();
        assert!(matches!(err, Error::Expression(_)));

        let nested = format!("{}hr{}", "sqrt(".repeat(400), ")".repeat(400));
        let err = similar_item(&inputs(&[nested.as_str()]), &CalculationContext::default())
            .unwrap_err();
        assert!(matches!(err, Error::Expression(ref m) if m.contains("deeper")));
    }

    #[test]
    fn node_binding_uses_predicted_rate() {
        let mut node = HardwareNode::new(1, None, "legacy");
        node.outputs.failure_rate_predicted = 5.0e-6;
        let si = SimilarItemInputs::for_node(&node, vec!["hr / 2".to_string()]);
        let res = similar_item(&si, &CalculationContext::default()).unwrap();
        assert!((res.results[0] - 2.5e-6).abs() < 1e-18);
    }
}
