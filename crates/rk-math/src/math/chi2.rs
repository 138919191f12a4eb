//! Chi-square distribution.
//!
//! Used by the MIL-HDBK-189 trend test and the Crow bounds on NHPP
//! power-law parameters.

use super::gamma::{gamma_p, gamma_q};

const PPF_MAX_ITERS: usize = 200;
const PPF_TOL: f64 = 1e-12;

/// CDF of χ² with `dof` degrees of freedom.
pub fn chi2_cdf(x: f64, dof: f64) -> f64 {
    if x.is_nan() || dof.is_nan() || dof <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    gamma_p(0.5 * dof, 0.5 * x)
}

/// Survival function of χ².
pub fn chi2_sf(x: f64, dof: f64) -> f64 {
    if x.is_nan() || dof.is_nan() || dof <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    gamma_q(0.5 * dof, 0.5 * x)
}

/// Quantile of χ²: the x with `chi2_cdf(x, dof) = p`.
///
/// Bisection on a bracket grown from the mean; the CDF is monotone so
/// this always converges.
pub fn chi2_ppf(p: f64, dof: f64) -> f64 {
    if p.is_nan() || dof.is_nan() || dof <= 0.0 || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return 0.0;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let mut lo = 0.0;
    let mut hi = dof.max(1.0);
    while chi2_cdf(hi, dof) < p {
        lo = hi;
        hi *= 2.0;
    }
    for _ in 0..PPF_MAX_ITERS {
        let mid = 0.5 * (lo + hi);
        if chi2_cdf(mid, dof) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= PPF_TOL * hi.max(1.0) {
            break;
        }
    }
    0.5 * (lo + hi)
}
