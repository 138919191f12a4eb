//! NHPP power-law (Crow–AMSAA / Duane) reliability growth.
//!
//! Intensity `λβt^(β−1)`. Each growth row refits the model on the failures
//! observed up to that row's cumulative time, time-terminated there.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rk_common::{ConfidenceMethod, FitMethod, Result};
use rk_math::regression::ols;
use rk_math::optimize::invert_2x2;
use rk_math::{chi2_ppf, t_ppf};
use serde::{Deserialize, Serialize};

use super::bounds::Bounded;
use super::growth::{check_power_law_methods, cramer_von_mises, GrowthRow};
use super::record::{AnalysisOptions, GrowthObservation};
use crate::degraded::{finite_or_zero, ratio_or_zero};
use crate::logging::event_names;

/// Power-law fit over the whole growth table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerLawResult {
    pub rows: Vec<GrowthRow>,
    /// β for the final row.
    pub beta: Bounded,
    /// λ for the final row.
    pub lambda: Bounded,
    pub cramer_von_mises: f64,
}

/// Bootstrap settings for [`ConfidenceMethod::Bootstrap`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapSettings {
    pub samples: usize,
    pub seed: u64,
}

/// Closed-form MLE for failures observed to `end`.
///
/// Returns `(β, λ)`; `None` when there are no failures.
pub fn mle(obs: &[GrowthObservation], end: f64) -> Option<(f64, f64)> {
    let n: u32 = obs.iter().map(|o| o.failures).sum();
    if n == 0 {
        return None;
    }
    let nf = n as f64;
    let denom: f64 = obs
        .iter()
        .map(|o| o.failures as f64 * (end / o.cumulative_time).ln())
        .sum();
    let beta = if denom > 0.0 && denom.is_finite() {
        nf / denom
    } else {
        tracing::warn!(
            event = event_names::RESULT_DEGRADED,
            quantity = "power_law.beta",
            fallback = 1.0,
            "all failures at the end of observation; shape set to one"
        );
        1.0
    };
    Some((beta, nf / end.powf(beta)))
}

/// Crow's multipliers on the cumulative MTBF for `n` failures.
fn crow_mtbf_multipliers(n: f64, z: f64) -> (f64, f64) {
    if n < 2.0 {
        tracing::warn!(
            event = event_names::RESULT_DEGRADED,
            quantity = "crow.multipliers",
            fallback = 1.0,
            "single failure; cumulative MTBF bounds collapsed"
        );
        return (1.0, 1.0);
    }
    let z2 = z * z;
    let lower_den = (n + z2 / 4.0 + (n * z2 / 4.0 + z2 * z2 / 16.0).sqrt()).powi(2);
    let upper_den = (n - z * (n / 2.0).sqrt()).powi(2);
    (
        ratio_or_zero(n * (n - 1.0), lower_den, "crow.lower_multiplier"),
        ratio_or_zero(n * (n - 1.0), upper_den, "crow.upper_multiplier"),
    )
}

/// χ² bounds on β and λ, both from `2n` degrees of freedom.
///
/// β scales the quantiles by `1 / (2n − 1)`. Near a 50% bound level that
/// can place the lower bound above β̂, so the interval is widened to hold it.
fn crow_bounds(n: f64, end: f64, beta: f64, lambda: f64, level: f64) -> (Bounded, Bounded) {
    let dof = 2.0 * n;
    let lo = chi2_ppf(1.0 - level, dof);
    let hi = chi2_ppf(level, dof);
    let t_beta = end.powf(beta);
    let beta_den = (dof - 1.0).max(1.0);
    let beta_b = Bounded::new(beta * lo / beta_den, beta, beta * hi / beta_den);
    (
        Bounded::new(beta_b.lower.min(beta), beta, beta_b.upper.max(beta)),
        Bounded::new(lo / (2.0 * t_beta), lambda, hi / (2.0 * t_beta)),
    )
}

/// Fisher-matrix bounds on β and λ, log-transformed.
fn fisher_bounds(n: f64, end: f64, beta: f64, lambda: f64, z: f64) -> (Bounded, Bounded) {
    let t_beta = end.powf(beta);
    let ln_t = end.ln();
    let info = [
        [n / (lambda * lambda), t_beta * ln_t],
        [t_beta * ln_t, n / (beta * beta) + lambda * t_beta * ln_t * ln_t],
    ];
    let (var_lambda, var_beta) = match invert_2x2(info) {
        Some(cov) => (cov[0][0], cov[1][1]),
        None => {
            tracing::warn!(
                event = event_names::RESULT_DEGRADED,
                quantity = "power_law.fisher_matrix",
                "singular information matrix; bounds collapsed"
            );
            (0.0, 0.0)
        }
    };
    (
        Bounded::log_transform(beta, var_beta, z, "power_law.beta"),
        Bounded::log_transform(lambda, var_lambda, z, "power_law.lambda"),
    )
}

/// Percentile value of a sorted sample.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Parametric bootstrap: resample `n` times as `T·U^(1/β̂)` and refit.
fn bootstrap_bounds(
    n: u32,
    end: f64,
    beta: f64,
    lambda: f64,
    level: f64,
    samples: usize,
    rng: &mut StdRng,
) -> (Bounded, Bounded) {
    let nf = n as f64;
    let mut betas = Vec::with_capacity(samples);
    let mut lambdas = Vec::with_capacity(samples);
    for _ in 0..samples {
        // ln(T / tᵢ) = −ln(U) / β̂
        let sum: f64 = (0..n)
            .map(|_| -(1.0 - rng.random::<f64>()).ln() / beta)
            .sum();
        if sum <= 0.0 {
            continue;
        }
        let b = nf / sum;
        betas.push(b);
        lambdas.push(nf / end.powf(b));
    }
    if betas.is_empty() {
        return (Bounded::exact(beta), Bounded::exact(lambda));
    }
    betas.sort_by(f64::total_cmp);
    lambdas.sort_by(f64::total_cmp);
    (
        Bounded::new(percentile(&betas, 1.0 - level), beta, percentile(&betas, level)),
        Bounded::new(
            percentile(&lambdas, 1.0 - level),
            lambda,
            percentile(&lambdas, level),
        ),
    )
}

/// Assemble a row from α, b and cumulative-MTBF bounds.
fn row(time: f64, failures: u32, alpha: Bounded, b: Bounded, mc: Bounded) -> GrowthRow {
    let growth = 1.0 - alpha.point;
    let mi = mc.map(|m| ratio_or_zero(m, growth, "instantaneous_mtbf"));
    GrowthRow {
        time,
        failures,
        observed_mtbf: ratio_or_zero(time, failures as f64, "observed_mtbf"),
        shape: alpha,
        scale: b,
        cumulative_mtbf: mc,
        instantaneous_mtbf: mi,
        cumulative_intensity: mc.reciprocal("cumulative_intensity"),
        instantaneous_intensity: mi.reciprocal("instantaneous_intensity"),
    }
}

struct MleRow {
    row: GrowthRow,
    beta: Bounded,
    lambda: Bounded,
}

fn mle_row(
    obs: &[GrowthObservation],
    end: f64,
    opts: &AnalysisOptions,
    boot: BootstrapSettings,
    rng: &mut StdRng,
) -> Option<MleRow> {
    let (beta, lambda) = mle(obs, end)?;
    let n: u32 = obs.iter().map(|o| o.failures).sum();
    let nf = n as f64;
    let level = opts.bound_level();
    let z = opts.z();

    let (beta_b, lambda_b) = match opts.confidence_method {
        ConfidenceMethod::Bootstrap => {
            bootstrap_bounds(n, end, beta, lambda, level, boot.samples, rng)
        }
        ConfidenceMethod::FisherMatrix => fisher_bounds(nf, end, beta, lambda, z),
        _ => crow_bounds(nf, end, beta, lambda, level),
    };

    let mc = end.powf(1.0 - beta) / lambda;
    let (mll, mul) = crow_mtbf_multipliers(nf, z);
    let mc_b = Bounded::new(mc * mll, mc, mc * mul);
    let alpha = beta_b.map(|b| 1.0 - b);
    let b = lambda_b.reciprocal("power_law.b");

    Some(MleRow {
        row: row(end, n, alpha, b, mc_b),
        beta: beta_b,
        lambda: lambda_b,
    })
}

/// Duane fit: least squares of ln(observed cumulative MTBF) on ln(T).
fn duane_row(obs: &[GrowthObservation], end: f64, opts: &AnalysisOptions) -> Option<MleRow> {
    let mut failures = 0;
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for o in obs {
        failures += o.failures;
        if failures > 0 && o.cumulative_time > 0.0 {
            xs.push(o.cumulative_time.ln());
            ys.push((o.cumulative_time / failures as f64).ln());
        }
    }
    if failures == 0 {
        return None;
    }

    let (alpha, ln_b, alpha_se, ln_b_se, sigma) = match ols(&xs, &ys) {
        Some(fit) => (
            fit.slope,
            fit.intercept,
            fit.slope_std_err().unwrap_or(0.0),
            fit.intercept_std_err().unwrap_or(0.0),
            fit.residual_variance().unwrap_or(0.0).sqrt(),
        ),
        None => {
            tracing::warn!(
                event = event_names::RESULT_DEGRADED,
                quantity = "duane.alpha",
                fallback = 0.0,
                "fewer than two distinct points; no growth assumed"
            );
            (0.0, (end / failures as f64).ln(), 0.0, 0.0, 0.0)
        }
    };

    let points = xs.len() as f64;
    let t = if points > 2.0 {
        t_ppf(opts.bound_level(), points - 2.0)
    } else {
        0.0
    };
    let z = opts.z();
    let alpha_b = Bounded::new(alpha - t * alpha_se, alpha, alpha + t * alpha_se);
    let b_b = Bounded::new(
        (ln_b - t * ln_b_se).exp(),
        ln_b.exp(),
        (ln_b + t * ln_b_se).exp(),
    );
    let mc = ln_b.exp() * end.powf(alpha);
    let mc_b = Bounded::new(mc * (-z * sigma).exp(), mc, mc * (z * sigma).exp());

    Some(MleRow {
        row: row(end, failures, alpha_b, b_b, mc_b),
        beta: alpha_b.map(|a| 1.0 - a),
        lambda: b_b.reciprocal("duane.lambda"),
    })
}

/// Fit the power law to growth observations.
///
/// `end_time` extends the final row's observation window past the last
/// failure (time-terminated testing).
pub fn power_law(
    obs: &[GrowthObservation],
    end_time: Option<f64>,
    opts: &AnalysisOptions,
    boot: BootstrapSettings,
) -> Result<PowerLawResult> {
    check_power_law_methods(opts.fit_method, opts.confidence_method)?;
    let mut rng = StdRng::seed_from_u64(boot.seed);

    let mut rows = Vec::with_capacity(obs.len());
    let mut last: Option<MleRow> = None;
    let mut last_end = 0.0;
    for k in 0..obs.len() {
        let mut end = obs[k].cumulative_time;
        if k + 1 == obs.len() {
            end = end.max(end_time.unwrap_or(end));
        }
        let fitted = match opts.fit_method {
            FitMethod::Mle => mle_row(&obs[..=k], end, opts, boot, &mut rng),
            FitMethod::RankRegression => duane_row(&obs[..=k], end, opts),
        };
        match fitted {
            Some(r) => {
                rows.push(r.row);
                last = Some(r);
            }
            None => rows.push(GrowthRow::empty(end)),
        }
        last_end = end;
    }

    let (beta, lambda) = match &last {
        Some(r) => (r.beta, r.lambda),
        None => (Bounded::exact(0.0), Bounded::exact(0.0)),
    };
    let cvm = finite_or_zero(
        cramer_von_mises(obs, last_end, beta.point),
        "cramer_von_mises",
    );
    Ok(PowerLawResult {
        rows,
        beta,
        lambda,
        cramer_von_mises: cvm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_common::ConfidenceType;

    fn opts(fit: FitMethod, method: ConfidenceMethod) -> AnalysisOptions {
        AnalysisOptions {
            fit_method: fit,
            confidence: 0.9,
            confidence_type: ConfidenceType::TwoSided,
            confidence_method: method,
        }
    }

    fn boot() -> BootstrapSettings {
        BootstrapSettings {
            samples: 400,
            seed: 7,
        }
    }

    // Crow's classic example: 40 failures to 1000 hours.
    fn crow_data() -> Vec<GrowthObservation> {
        [
            0.7, 3.7, 13.2, 17.6, 54.5, 99.2, 112.2, 120.9, 151.0, 163.0, 174.5, 191.6, 282.8,
            355.2, 486.3, 490.5, 513.3, 558.4, 678.1, 699.0, 785.9, 887.0, 1010.7, 1029.1,
            1034.4, 1136.1, 1178.9, 1259.7, 1297.9, 1419.7, 1571.7, 1629.8, 1702.4, 1928.9,
            2072.3, 2525.2, 2928.5, 3016.4, 3181.0, 3256.3,
        ]
        .iter()
        .map(|&t| GrowthObservation {
            cumulative_time: t,
            failures: 1,
        })
        .collect()
    }

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1.0)
    }

    #[test]
    fn mle_matches_closed_form() {
        let obs = crow_data();
        let (beta, lambda) = mle(&obs, 3256.3).unwrap();
        let denom: f64 = obs.iter().map(|o| (3256.3 / o.cumulative_time).ln()).sum();
        assert!(approx_eq(beta, 40.0 / denom, 1e-12));
        assert!(approx_eq(lambda, 40.0 / 3256.3f64.powf(beta), 1e-12));
        assert!(beta < 1.0);
    }

    #[test]
    fn cumulative_mtbf_is_time_over_failures_at_mle() {
        let obs = crow_data();
        let res = power_law(&obs, None, &opts(FitMethod::Mle, ConfidenceMethod::Crow), boot())
            .unwrap();
        let last = res.rows.last().unwrap();
        assert_eq!(last.failures, 40);
        assert!(approx_eq(last.cumulative_mtbf.point, 3256.3 / 40.0, 1e-9));
        let beta = 1.0 - last.shape.point;
        assert!(approx_eq(last.instantaneous_mtbf.point, last.cumulative_mtbf.point / beta, 1e-9));
        assert!(approx_eq(
            last.instantaneous_intensity.point,
            beta * last.cumulative_intensity.point,
            1e-9
        ));
    }

    #[test]
    fn every_method_gives_ordered_bounds() {
        let obs = crow_data();
        for (fit, method) in [
            (FitMethod::Mle, ConfidenceMethod::Crow),
            (FitMethod::Mle, ConfidenceMethod::FisherMatrix),
            (FitMethod::Mle, ConfidenceMethod::Bootstrap),
            (FitMethod::RankRegression, ConfidenceMethod::Duane),
        ] {
            let res = power_law(&obs, Some(3500.0), &opts(fit, method), boot()).unwrap();
            assert_eq!(res.rows.len(), obs.len());
            for r in &res.rows[2..] {
                assert!(r.shape.is_ordered(), "{fit} {method}");
                assert!(r.scale.is_ordered(), "{fit} {method}");
                assert!(r.cumulative_mtbf.is_ordered(), "{fit} {method}");
                assert!(r.instantaneous_intensity.is_ordered(), "{fit} {method}");
            }
            assert!(res.beta.is_ordered());
            assert!(res.cramer_von_mises >= 0.0);
        }
    }

    #[test]
    fn crow_shape_bounds_use_two_n_minus_one() {
        let (beta, lambda) = crow_bounds(40.0, 3256.3, 0.5, 0.1, 0.95);
        assert!(approx_eq(beta.lower, 0.5 * chi2_ppf(0.05, 80.0) / 79.0, 1e-12));
        assert!(approx_eq(beta.upper, 0.5 * chi2_ppf(0.95, 80.0) / 79.0, 1e-12));
        let t_beta = 3256.3f64.powf(0.5);
        assert!(approx_eq(lambda.upper, chi2_ppf(0.95, 80.0) / (2.0 * t_beta), 1e-12));

        for level in [0.5, 0.55, 0.9] {
            for n in [1.0, 2.0, 40.0] {
                let (beta, lambda) = crow_bounds(n, 100.0, 0.7, 0.2, level);
                assert!(beta.is_ordered(), "n={n} level={level}");
                assert!(lambda.lower <= lambda.upper);
            }
        }
    }

    #[test]
    fn bootstrap_is_reproducible_for_a_seed() {
        let obs = crow_data();
        let o = opts(FitMethod::Mle, ConfidenceMethod::Bootstrap);
        let a = power_law(&obs, None, &o, boot()).unwrap();
        let b = power_law(&obs, None, &o, boot()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn incompatible_pairing_is_rejected() {
        let obs = crow_data();
        let res = power_law(
            &obs,
            None,
            &opts(FitMethod::RankRegression, ConfidenceMethod::Crow),
            boot(),
        );
        assert!(matches!(
            res,
            Err(rk_common::Error::IncompatibleMethods { .. })
        ));
    }

    #[test]
    fn end_time_extends_final_row() {
        let obs = crow_data();
        let res = power_law(&obs, Some(4000.0), &opts(FitMethod::Mle, ConfidenceMethod::Crow), boot())
            .unwrap();
        assert_eq!(res.rows.last().unwrap().time, 4000.0);
        assert_eq!(res.rows[0].time, 0.7);
    }

    #[test]
    fn all_failures_at_end_degrade_to_unit_shape() {
        let obs = vec![GrowthObservation {
            cumulative_time: 50.0,
            failures: 3,
        }];
        let (beta, lambda) = mle(&obs, 50.0).unwrap();
        assert_eq!(beta, 1.0);
        assert!(approx_eq(lambda, 3.0 / 50.0, 1e-12));
    }
}
