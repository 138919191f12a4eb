//! Property-based tests for the distribution functions and solvers.

use proptest::prelude::*;
use rk_math::optimize::{bisect, SolverOptions};
use rk_math::{chi2_cdf, chi2_ppf, normal_cdf, normal_ppf, t_cdf, t_ppf};

fn opts() -> SolverOptions {
    SolverOptions {
        tolerance: 1e-12,
        max_iterations: 200,
    }
}

proptest! {
    #[test]
    fn normal_ppf_inverts_cdf(p in 0.001f64..0.999) {
        prop_assert!((normal_cdf(normal_ppf(p)) - p).abs() < 1e-7);
    }

    #[test]
    fn normal_ppf_is_monotone(p in 0.01f64..0.98, dp in 0.001f64..0.01) {
        prop_assert!(normal_ppf(p) < normal_ppf(p + dp));
    }

    #[test]
    fn chi2_ppf_inverts_cdf(p in 0.01f64..0.99, dof in 1.0f64..100.0) {
        prop_assert!((chi2_cdf(chi2_ppf(p, dof), dof) - p).abs() < 1e-5);
    }

    #[test]
    fn t_ppf_inverts_cdf(p in 0.01f64..0.99, dof in 1.0f64..100.0) {
        prop_assert!((t_cdf(t_ppf(p, dof), dof) - p).abs() < 1e-5);
    }

    #[test]
    fn bisect_finds_square_root(a in 0.01f64..1e4) {
        let root = bisect(|x| x * x - a, 0.0, a.max(1.0), opts()).unwrap();
        prop_assert!((root - a.sqrt()).abs() <= 1e-6 * a.sqrt().max(1.0));
    }
}
