//! Idealized reliability-growth planning.
//!
//! An [`IdealizedPlan`] carries whichever planning quantities are known;
//! [`IdealizedPlan::solve`] fills the rest from the planning relations and
//! fails when the given subset does not determine them.

use rk_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::degraded::ratio_or_zero;

/// Planning quantities; `None` means "solve for this".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdealizedPlan {
    pub mtbf_initial: Option<f64>,
    pub mtbf_final: Option<f64>,
    pub total_time: Option<f64>,
    /// Length of the initial test phase, `t1`.
    pub growth_start: Option<f64>,
    /// Management strategy, the fraction of failure modes that get fixed.
    pub management_strategy: Option<f64>,
    pub growth_rate: Option<f64>,
    /// Probability of seeing at least one failure in `t1`.
    pub probability: Option<f64>,
    /// Average fix effectiveness factor.
    pub fix_effectiveness: Option<f64>,
}

/// A fully solved plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSolution {
    pub mtbf_initial: f64,
    pub mtbf_final: f64,
    pub total_time: f64,
    pub growth_start: f64,
    pub growth_rate: f64,
    pub management_strategy: Option<f64>,
    pub probability: Option<f64>,
    pub fix_effectiveness: Option<f64>,
    /// Growth potential `MI / (1 − MS·FEF)`, when MS and FEF are known.
    pub mtbf_growth_potential: Option<f64>,
}

/// `MI·exp(GR(GR/2 + ln(t/t1) + 1))`.
fn idealized_mtbf(mi: f64, gr: f64, t: f64, t1: f64) -> f64 {
    mi * (gr * (0.5 * gr + (t / t1).ln() + 1.0)).exp()
}

fn growth_rate(mi: f64, mf: f64, ttt: f64, t1: f64) -> f64 {
    let l = (ttt / t1).ln();
    -l - 1.0 + ((1.0 + l).powi(2) + 2.0 * (mf / mi).ln()).sqrt()
}

fn total_time(mi: f64, mf: f64, gr: f64, t1: f64) -> f64 {
    (t1.ln() + ((mf / mi).ln() + (1.0 - gr).ln()) / gr).exp()
}

/// Set `slot` from `value` when empty and the value is finite.
fn fill(slot: &mut Option<f64>, value: Option<f64>) -> bool {
    match (slot.is_none(), value) {
        (true, Some(v)) if v.is_finite() => {
            *slot = Some(v);
            true
        }
        _ => false,
    }
}

impl IdealizedPlan {
    fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("mtbf_initial", self.mtbf_initial),
            ("mtbf_final", self.mtbf_final),
            ("total_time", self.total_time),
            ("growth_start", self.growth_start),
        ] {
            if let Some(v) = v {
                if !(v > 0.0) {
                    return Err(Error::invalid(name, format!("must be positive, got {}", v)));
                }
            }
        }
        for (name, v) in [
            ("management_strategy", self.management_strategy),
            ("probability", self.probability),
            ("fix_effectiveness", self.fix_effectiveness),
            ("growth_rate", self.growth_rate),
        ] {
            if let Some(v) = v {
                if !(v > 0.0 && v < 1.0) {
                    return Err(Error::invalid(name, format!("must be in (0, 1), got {}", v)));
                }
            }
        }
        Ok(())
    }

    /// One pass over every relation; returns whether anything was filled.
    fn pass(&mut self) -> bool {
        let s = *self;
        let mut changed = false;

        if let (Some(t1), Some(ms), Some(mi)) = (s.growth_start, s.management_strategy, s.mtbf_initial) {
            changed |= fill(&mut self.probability, Some(1.0 - (-t1 * ms / mi).exp()));
        }
        if let (Some(p), Some(mi), Some(t1)) = (s.probability, s.mtbf_initial, s.growth_start) {
            changed |= fill(&mut self.management_strategy, Some(-(1.0 - p).ln() * mi / t1));
        }
        if let (Some(p), Some(mi), Some(ms)) = (s.probability, s.mtbf_initial, s.management_strategy) {
            changed |= fill(&mut self.growth_start, Some(-(1.0 - p).ln() * mi / ms));
        }
        if let (Some(t1), Some(ms), Some(p)) = (s.growth_start, s.management_strategy, s.probability) {
            changed |= fill(&mut self.mtbf_initial, Some(-t1 * ms / (1.0 - p).ln()));
        }
        if let (Some(mf), Some(gr), Some(ttt), Some(t1)) =
            (s.mtbf_final, s.growth_rate, s.total_time, s.growth_start)
        {
            changed |= fill(
                &mut self.mtbf_initial,
                Some(mf / idealized_mtbf(1.0, gr, ttt, t1)),
            );
        }
        if let (Some(mi), Some(gr), Some(ttt), Some(t1)) =
            (s.mtbf_initial, s.growth_rate, s.total_time, s.growth_start)
        {
            changed |= fill(&mut self.mtbf_final, Some(idealized_mtbf(mi, gr, ttt, t1)));
        }
        if let (Some(mi), Some(mf), Some(gr), Some(t1)) =
            (s.mtbf_initial, s.mtbf_final, s.growth_rate, s.growth_start)
        {
            changed |= fill(&mut self.total_time, Some(total_time(mi, mf, gr, t1)));
        }
        if let (Some(mi), Some(mf), Some(ttt), Some(t1)) =
            (s.mtbf_initial, s.mtbf_final, s.total_time, s.growth_start)
        {
            changed |= fill(&mut self.growth_rate, Some(growth_rate(mi, mf, ttt, t1)));
        }
        changed
    }

    /// Solve every quantity the known subset determines.
    pub fn solve(&self) -> Result<PlanSolution> {
        self.validate()?;
        let mut plan = *self;
        while plan.pass() {}

        let missing: Vec<&str> = [
            ("mtbf_initial", plan.mtbf_initial),
            ("mtbf_final", plan.mtbf_final),
            ("total_time", plan.total_time),
            ("growth_start", plan.growth_start),
            ("growth_rate", plan.growth_rate),
        ]
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| *name)
        .collect();

        let (Some(mi), Some(mf), Some(ttt), Some(t1), Some(gr)) = (
            plan.mtbf_initial,
            plan.mtbf_final,
            plan.total_time,
            plan.growth_start,
            plan.growth_rate,
        ) else {
            return Err(Error::UnsolvablePlan(format!(
                "cannot determine {}",
                missing.join(", ")
            )));
        };

        let gp = match (plan.management_strategy, plan.fix_effectiveness) {
            (Some(ms), Some(fef)) => Some(ratio_or_zero(mi, 1.0 - ms * fef, "mtbf_growth_potential")),
            _ => None,
        };

        Ok(PlanSolution {
            mtbf_initial: mi,
            mtbf_final: mf,
            total_time: ttt,
            growth_start: t1,
            growth_rate: gr,
            management_strategy: plan.management_strategy,
            probability: plan.probability,
            fix_effectiveness: plan.fix_effectiveness,
            mtbf_growth_potential: gp,
        })
    }
}

impl PlanSolution {
    /// Idealized MTBF curve at `points` evenly spaced times over `(0, TTT]`.
    ///
    /// Flat at the initial MTBF until `t1`, then growing.
    pub fn curve(&self, points: usize) -> Vec<(f64, f64)> {
        (1..=points)
            .map(|i| {
                let t = self.total_time * i as f64 / points as f64;
                let m = if t <= self.growth_start {
                    self.mtbf_initial
                } else {
                    idealized_mtbf(self.mtbf_initial, self.growth_rate, t, self.growth_start)
                };
                (t, m)
            })
            .collect()
    }
}

/// One test phase of a multi-phase plan.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthPhase {
    /// Cumulative test time at the start of the phase.
    pub start_time: f64,
    /// Cumulative test time at the end of the phase.
    pub total_time: Option<f64>,
    pub mtbf_initial: Option<f64>,
    pub mtbf_final: Option<f64>,
    pub growth_rate: Option<f64>,
    pub management_strategy: Option<f64>,
    pub probability: Option<f64>,
}

/// A phase with every quantity resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSolution {
    pub start_time: f64,
    pub total_time: f64,
    pub mtbf_initial: f64,
    pub mtbf_final: f64,
    pub growth_rate: f64,
}

fn require(value: Option<f64>, what: &str, purpose: &str) -> Result<f64> {
    value.ok_or_else(|| Error::UnsolvablePlan(format!("{} is needed to compute {}", what, purpose)))
}

impl GrowthPhase {
    /// Solve the phase's missing growth rate, MTBFs or test time, in that
    /// order.
    pub fn solve(&self) -> Result<PhaseSolution> {
        let ti = self.start_time;
        if !(ti > 0.0) {
            return Err(Error::invalid(
                "start_time",
                format!("must be positive, got {}", ti),
            ));
        }
        let mut gr = self.growth_rate;
        if gr.is_none() {
            if let (Some(ttt), Some(mi), Some(mf)) = (self.total_time, self.mtbf_initial, self.mtbf_final) {
                gr = Some(growth_rate(mi, mf, ttt, ti));
            }
        }

        let mi = match self.mtbf_initial {
            Some(mi) => mi,
            None => match (self.management_strategy, self.probability) {
                (Some(ms), Some(p)) => -ti * ms / (1.0 - p).ln(),
                _ => {
                    let mf = require(self.mtbf_final, "mtbf_final", "mtbf_initial")?;
                    let g = require(gr, "growth_rate", "mtbf_initial")?;
                    let ttt = require(self.total_time, "total_time", "mtbf_initial")?;
                    mf / idealized_mtbf(1.0, g, ttt, ti)
                }
            },
        };

        let mf = match self.mtbf_final {
            Some(mf) => mf,
            None => {
                let g = require(gr, "growth_rate", "mtbf_final")?;
                let ttt = require(self.total_time, "total_time", "mtbf_final")?;
                idealized_mtbf(mi, g, ttt, ti)
            }
        };

        let g = match gr {
            Some(g) => g,
            None => {
                let ttt = require(self.total_time, "total_time", "growth_rate")?;
                growth_rate(mi, mf, ttt, ti)
            }
        };

        let ttt = match self.total_time {
            Some(t) => t,
            None => total_time(mi, mf, g, ti),
        };

        Ok(PhaseSolution {
            start_time: ti,
            total_time: ttt,
            mtbf_initial: mi,
            mtbf_final: mf,
            growth_rate: g,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    // =========================================================================
    // Idealized plan
    // =========================================================================

    #[test]
    fn final_mtbf_from_rate_and_time() {
        let plan = IdealizedPlan {
            mtbf_initial: Some(50.0),
            total_time: Some(10_000.0),
            growth_start: Some(500.0),
            growth_rate: Some(0.3),
            ..Default::default()
        };
        let s = plan.solve().unwrap();
        let expected = 50.0 * (0.3f64 * (0.15 + 20.0f64.ln() + 1.0)).exp();
        assert!(approx_eq(s.mtbf_final, expected));
    }

    #[test]
    fn growth_rate_inverts_final_mtbf() {
        let base = IdealizedPlan {
            mtbf_initial: Some(50.0),
            total_time: Some(10_000.0),
            growth_start: Some(500.0),
            growth_rate: Some(0.3),
            ..Default::default()
        }
        .solve()
        .unwrap();
        let solved = IdealizedPlan {
            mtbf_initial: Some(50.0),
            mtbf_final: Some(base.mtbf_final),
            total_time: Some(10_000.0),
            growth_start: Some(500.0),
            ..Default::default()
        }
        .solve()
        .unwrap();
        assert!(approx_eq(solved.growth_rate, 0.3));
    }

    #[test]
    fn initial_mtbf_from_strategy_and_probability() {
        let plan = IdealizedPlan {
            growth_start: Some(200.0),
            management_strategy: Some(0.9),
            probability: Some(0.95),
            mtbf_final: Some(300.0),
            growth_rate: Some(0.25),
            fix_effectiveness: Some(0.7),
            ..Default::default()
        };
        let s = plan.solve().unwrap();
        assert!(approx_eq(s.mtbf_initial, -200.0 * 0.9 / 0.05f64.ln()));
        let gp = s.mtbf_growth_potential.unwrap();
        assert!(approx_eq(gp, s.mtbf_initial / (1.0 - 0.63)));
        assert!(s.total_time > s.growth_start);
    }

    #[test]
    fn underdetermined_plan_names_missing_fields() {
        let plan = IdealizedPlan {
            mtbf_initial: Some(50.0),
            ..Default::default()
        };
        match plan.solve() {
            Err(Error::UnsolvablePlan(msg)) => {
                assert!(msg.contains("mtbf_final"));
                assert!(msg.contains("growth_rate"));
            }
            other => panic!("expected UnsolvablePlan, got {:?}", other.map(|s| s.mtbf_final)),
        }
    }

    #[test]
    fn out_of_range_probability_is_invalid() {
        let plan = IdealizedPlan {
            probability: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(plan.solve(), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn curve_ends_at_final_mtbf() {
        let s = IdealizedPlan {
            mtbf_initial: Some(50.0),
            total_time: Some(10_000.0),
            growth_start: Some(500.0),
            growth_rate: Some(0.3),
            ..Default::default()
        }
        .solve()
        .unwrap();
        let curve = s.curve(20);
        assert_eq!(curve.len(), 20);
        assert_eq!(curve[0].1, 50.0);
        assert!(approx_eq(curve[19].1, s.mtbf_final));
    }

    // =========================================================================
    // Phase plan
    // =========================================================================

    #[test]
    fn phase_solves_growth_rate_then_keeps_inputs() {
        let phase = GrowthPhase {
            start_time: 500.0,
            total_time: Some(5000.0),
            mtbf_initial: Some(40.0),
            mtbf_final: Some(120.0),
            ..Default::default()
        };
        let s = phase.solve().unwrap();
        assert!(approx_eq(
            idealized_mtbf(40.0, s.growth_rate, 5000.0, 500.0),
            120.0
        ));
        assert_eq!(s.total_time, 5000.0);
    }

    #[test]
    fn phase_solves_test_time() {
        let phase = GrowthPhase {
            start_time: 500.0,
            mtbf_initial: Some(40.0),
            mtbf_final: Some(120.0),
            growth_rate: Some(0.35),
            ..Default::default()
        };
        let s = phase.solve().unwrap();
        assert!(approx_eq(s.total_time, total_time(40.0, 120.0, 0.35, 500.0)));
    }

    #[test]
    fn phase_without_prerequisites_fails() {
        let phase = GrowthPhase {
            start_time: 500.0,
            mtbf_final: Some(120.0),
            ..Default::default()
        };
        assert!(matches!(phase.solve(), Err(Error::UnsolvablePlan(_))));
    }
}
