//! Student's t distribution.
//!
//! Confidence limits on rank-regression growth parameters use the t
//! quantile with n - 2 degrees of freedom.

use super::beta::beta_inc;

const PPF_MAX_ITERS: usize = 200;
const PPF_TOL: f64 = 1e-12;

/// CDF of Student's t with `dof` degrees of freedom.
pub fn t_cdf(t: f64, dof: f64) -> f64 {
    if t.is_nan() || dof.is_nan() || dof <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return if t > 0.0 { 1.0 } else { 0.0 };
    }
    let x = dof / (dof + t * t);
    let tail = 0.5 * beta_inc(x, 0.5 * dof, 0.5);
    if t > 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Quantile of Student's t.
pub fn t_ppf(p: f64, dof: f64) -> f64 {
    if p.is_nan() || dof.is_nan() || dof <= 0.0 || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    if p == 0.5 {
        return 0.0;
    }

    let mut lo = -1.0;
    let mut hi = 1.0;
    while t_cdf(lo, dof) > p {
        hi = lo;
        lo *= 2.0;
    }
    while t_cdf(hi, dof) < p {
        lo = hi;
        hi *= 2.0;
    }
    for _ in 0..PPF_MAX_ITERS {
        let mid = 0.5 * (lo + hi);
        if t_cdf(mid, dof) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= PPF_TOL * hi.abs().max(1.0) {
            break;
        }
    }
    0.5 * (lo + hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn cauchy_special_case() {
        // t with 1 dof is Cauchy: F(1) = 0.75
        assert!(approx_eq(t_cdf(1.0, 1.0), 0.75, 1e-12));
        assert!(approx_eq(t_ppf(0.75, 1.0), 1.0, 1e-9));
    }

    #[test]
    fn table_quantiles() {
        assert!(approx_eq(t_ppf(0.975, 10.0), 2.228_138_851_986_273_5, 1e-8));
        assert!(approx_eq(t_ppf(0.95, 3.0), 2.353_363_434_801_823, 1e-8));
        assert!(approx_eq(t_ppf(0.025, 10.0), -2.228_138_851_986_273_5, 1e-8));
    }

    #[test]
    fn symmetric_about_zero() {
        assert!(approx_eq(t_cdf(0.0, 5.0), 0.5, 1e-15));
        assert!(approx_eq(t_cdf(-1.3, 7.0), 1.0 - t_cdf(1.3, 7.0), 1e-13));
    }
}
