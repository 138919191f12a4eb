//! NHPP log-linear (Cox–Lewis) growth model with intensity `exp(γ0 + γ1 t)`.

use rk_common::{FitMethod, Result};
use rk_math::optimize::{bisect, hessian_2d, invert_2x2, SolverOptions};
use serde::{Deserialize, Serialize};

use super::bounds::Bounded;
use super::growth::{incompatible, GrowthRow};
use super::record::{AnalysisOptions, GrowthObservation};
use crate::degraded::{finite_or_zero, ratio_or_zero};
use crate::logging::event_names;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLinearResult {
    pub rows: Vec<GrowthRow>,
    /// γ0 for the final row.
    pub gamma0: Bounded,
    /// γ1 for the final row.
    pub gamma1: Bounded,
}

/// `(eᵘ − 1) / u`, continuous through zero.
fn expm1_over(u: f64) -> f64 {
    if u.abs() < 1e-8 {
        1.0 + 0.5 * u
    } else {
        u.exp_m1() / u
    }
}

/// `1/(1 − e⁻ᵘ) − 1/u`, the mean event position as a fraction of `T`.
fn mean_fraction(u: f64) -> f64 {
    if u.abs() < 1e-3 {
        0.5 + u / 12.0 - u * u * u / 720.0
    } else {
        1.0 / -(-u).exp_m1() - 1.0 / u
    }
}

/// Expected failures by `end`.
fn expected_count(g0: f64, g1: f64, end: f64) -> f64 {
    g0.exp() * end * expm1_over(g1 * end)
}

fn log_likelihood(obs: &[GrowthObservation], end: f64, g: [f64; 2]) -> f64 {
    let (n, sum_t) = totals(obs);
    n * g[0] + g[1] * sum_t - expected_count(g[0], g[1], end)
}

fn totals(obs: &[GrowthObservation]) -> (f64, f64) {
    obs.iter().fold((0.0, 0.0), |(n, s), o| {
        let k = o.failures as f64;
        (n + k, s + k * o.cumulative_time)
    })
}

/// MLE of `(γ0, γ1)` for failures observed to `end`.
///
/// `γ1` solves `t̄/T = 1/(1 − e^(−γ1 T)) − 1/(γ1 T)`; without a root the
/// model degrades to a constant intensity.
pub fn mle(obs: &[GrowthObservation], end: f64, solver: SolverOptions) -> Option<(f64, f64)> {
    let (n, sum_t) = totals(obs);
    if n == 0.0 || !(end > 0.0) {
        return None;
    }
    let target = sum_t / n / end;
    let u = bisect(|u| target - mean_fraction(u), -700.0, 700.0, solver);
    let u = match u {
        Some(u) => u,
        None => {
            tracing::warn!(
                event = event_names::RESULT_DEGRADED,
                quantity = "log_linear.gamma1",
                fallback = 0.0,
                "no trend root; constant intensity assumed"
            );
            0.0
        }
    };
    let g1 = u / end;
    let g0 = (n / end).ln() - expm1_over(u).ln();
    Some((g0, g1))
}

fn row(obs: &[GrowthObservation], end: f64, opts: &AnalysisOptions, solver: SolverOptions) -> Option<(GrowthRow, Bounded, Bounded)> {
    let (g0, g1) = mle(obs, end, solver)?;
    let (n, _) = totals(obs);
    let z = opts.z();

    let h = hessian_2d(&|g: [f64; 2]| log_likelihood(obs, end, g), [g0, g1]);
    let (v00, v11, v01) = match invert_2x2([[-h[0][0], -h[0][1]], [-h[1][0], -h[1][1]]]) {
        Some(c) => (
            finite_or_zero(c[0][0], "log_linear.var_gamma0"),
            finite_or_zero(c[1][1], "log_linear.var_gamma1"),
            finite_or_zero(c[0][1], "log_linear.cov"),
        ),
        None => (0.0, 0.0, 0.0),
    };

    let gamma0 = Bounded::symmetric(g0, v00, z, "log_linear.gamma0");
    let gamma1 = Bounded::symmetric(g1, v11, z, "log_linear.gamma1");

    // instantaneous intensity at T, delta method on γ0 + γ1 T
    let li = (g0 + g1 * end).exp();
    let var_ln_li = (v00 + end * end * v11 + 2.0 * end * v01).max(0.0);
    let sd = var_ln_li.sqrt();
    let li_b = Bounded::new(li * (-z * sd).exp(), li, li * (z * sd).exp());

    // cumulative count N(T), gradient of ln N is (1, T·g(u))
    let count = expected_count(g0, g1, end);
    let d1 = end * mean_fraction(g1 * end);
    let var_ln_n = (v00 + 2.0 * d1 * v01 + d1 * d1 * v11).max(0.0);
    let sd = var_ln_n.sqrt();
    let lc_b = Bounded::new(count * (-z * sd).exp(), count, count * (z * sd).exp())
        .map(|c| ratio_or_zero(c, end, "cumulative_intensity"));

    let failures = n as u32;
    Some((
        GrowthRow {
            time: end,
            failures,
            observed_mtbf: ratio_or_zero(end, n, "observed_mtbf"),
            shape: gamma1,
            scale: gamma0,
            cumulative_mtbf: lc_b.reciprocal("cumulative_mtbf"),
            instantaneous_mtbf: li_b.reciprocal("instantaneous_mtbf"),
            cumulative_intensity: lc_b,
            instantaneous_intensity: li_b,
        },
        gamma0,
        gamma1,
    ))
}

/// Fit the log-linear model row by row. MLE only.
pub fn log_linear(
    obs: &[GrowthObservation],
    end_time: Option<f64>,
    opts: &AnalysisOptions,
    solver: SolverOptions,
) -> Result<LogLinearResult> {
    if opts.fit_method != FitMethod::Mle {
        return Err(incompatible(opts.fit_method, opts.confidence_method));
    }
    let mut rows = Vec::with_capacity(obs.len());
    let mut gamma0 = Bounded::exact(0.0);
    let mut gamma1 = Bounded::exact(0.0);
    for k in 0..obs.len() {
        let mut end = obs[k].cumulative_time;
        if k + 1 == obs.len() {
            end = end.max(end_time.unwrap_or(end));
        }
        match row(&obs[..=k], end, opts, solver) {
            Some((r, g0, g1)) => {
                rows.push(r);
                gamma0 = g0;
                gamma1 = g1;
            }
            None => rows.push(GrowthRow::empty(end)),
        }
    }
    Ok(LogLinearResult {
        rows,
        gamma0,
        gamma1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_common::{ConfidenceMethod, ConfidenceType};

    fn opts(fit: FitMethod) -> AnalysisOptions {
        AnalysisOptions {
            fit_method: fit,
            confidence: 0.9,
            confidence_type: ConfidenceType::TwoSided,
            confidence_method: ConfidenceMethod::FisherMatrix,
        }
    }

    fn obs(times: &[f64]) -> Vec<GrowthObservation> {
        times
            .iter()
            .map(|&t| GrowthObservation {
                cumulative_time: t,
                failures: 1,
            })
            .collect()
    }

    #[test]
    fn mean_fraction_is_continuous_at_zero() {
        let a = mean_fraction(1.0e-3 * 0.999);
        let b = mean_fraction(1.0e-3 * 1.001);
        assert!((a - b).abs() < 1e-6);
        assert!((mean_fraction(0.0) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn centred_failures_have_no_trend() {
        let o = obs(&[10.0, 30.0, 50.0, 70.0, 90.0]);
        let (g0, g1) = mle(&o, 100.0, SolverOptions::default()).unwrap();
        assert!(g1.abs() < 1e-6);
        assert!((g0 - (5.0f64 / 100.0).ln()).abs() < 1e-6);
    }

    #[test]
    fn expected_count_matches_failures_at_mle() {
        let o = obs(&[5.0, 20.0, 28.0, 60.0, 61.0, 75.0, 80.0]);
        let (g0, g1) = mle(&o, 90.0, SolverOptions::default()).unwrap();
        assert!((expected_count(g0, g1, 90.0) - 7.0).abs() < 1e-6);
        assert!(g1 > 0.0);
    }

    #[test]
    fn rows_have_ordered_bounds() {
        let o = obs(&[5.0, 20.0, 28.0, 60.0, 61.0, 75.0, 80.0]);
        let res = log_linear(&o, Some(100.0), &opts(FitMethod::Mle), SolverOptions::default())
            .unwrap();
        assert_eq!(res.rows.len(), 7);
        let last = res.rows.last().unwrap();
        assert_eq!(last.time, 100.0);
        assert!(last.instantaneous_intensity.is_ordered());
        assert!(last.cumulative_intensity.is_ordered());
        assert!(last.cumulative_mtbf.is_ordered());
        assert!(res.gamma1.is_ordered());
    }

    #[test]
    fn rank_regression_is_rejected() {
        let o = obs(&[5.0, 20.0]);
        assert!(log_linear(&o, None, &opts(FitMethod::RankRegression), SolverOptions::default())
            .is_err());
    }
}
