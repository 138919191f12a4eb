//! Root finding and small-dimension maximization.
//!
//! Everything here works on closures over `f64` so the survival models
//! can hand in log-likelihoods and score equations directly.

/// Options shared by the iterative solvers.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    /// Absolute tolerance on the solution.
    pub tolerance: f64,
    /// Iteration cap.
    pub max_iterations: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 200,
        }
    }
}

/// Bisection on a bracket `[lo, hi]` where `f(lo)` and `f(hi)` differ in sign.
///
/// Returns `None` when the bracket does not straddle a root or either end
/// evaluates to NaN.
pub fn bisect<F>(f: F, mut lo: f64, mut hi: f64, opts: SolverOptions) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    let mut f_lo = f(lo);
    let f_hi = f(hi);
    if f_lo.is_nan() || f_hi.is_nan() {
        return None;
    }
    if f_lo == 0.0 {
        return Some(lo);
    }
    if f_hi == 0.0 {
        return Some(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return None;
    }
    for _ in 0..opts.max_iterations {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid.is_nan() {
            return None;
        }
        if f_mid == 0.0 || (hi - lo).abs() < opts.tolerance * mid.abs().max(1.0) {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

/// Grow `[lo, hi]` geometrically away from `lo` until `f` changes sign.
///
/// `lo` must be positive; useful for rate and shape parameters whose root
/// lies somewhere on (0, ∞).
pub fn bracket_positive<F>(f: &F, lo: f64, hi: f64, max_doublings: usize) -> Option<(f64, f64)>
where
    F: Fn(f64) -> f64,
{
    let f_lo = f(lo);
    if f_lo.is_nan() {
        return None;
    }
    let mut a = lo;
    let mut b = hi;
    for _ in 0..max_doublings {
        let f_b = f(b);
        if f_b.is_nan() {
            return None;
        }
        if f_b.signum() != f_lo.signum() || f_b == 0.0 {
            return Some((a, b));
        }
        a = b;
        b *= 2.0;
    }
    None
}

/// Inverse of a 2×2 matrix, or `None` when singular.
pub fn invert_2x2(m: [[f64; 2]; 2]) -> Option<[[f64; 2]; 2]> {
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    Some([
        [m[1][1] / det, -m[0][1] / det],
        [-m[1][0] / det, m[0][0] / det],
    ])
}

fn step_size(x: f64) -> f64 {
    1e-5 * x.abs().max(1e-3)
}

/// Central-difference gradient of a two-parameter function.
pub fn gradient_2d<F>(f: &F, x: [f64; 2]) -> [f64; 2]
where
    F: Fn([f64; 2]) -> f64,
{
    let mut g = [0.0; 2];
    for (i, gi) in g.iter_mut().enumerate() {
        let h = step_size(x[i]);
        let mut up = x;
        let mut dn = x;
        up[i] += h;
        dn[i] -= h;
        *gi = (f(up) - f(dn)) / (2.0 * h);
    }
    g
}

/// Central-difference Hessian of a two-parameter function.
pub fn hessian_2d<F>(f: &F, x: [f64; 2]) -> [[f64; 2]; 2]
where
    F: Fn([f64; 2]) -> f64,
{
    let h = [step_size(x[0]), step_size(x[1])];
    let f0 = f(x);
    let at = |d0: f64, d1: f64| f([x[0] + d0, x[1] + d1]);

    let h00 = (at(h[0], 0.0) - 2.0 * f0 + at(-h[0], 0.0)) / (h[0] * h[0]);
    let h11 = (at(0.0, h[1]) - 2.0 * f0 + at(0.0, -h[1])) / (h[1] * h[1]);
    let h01 = (at(h[0], h[1]) - at(h[0], -h[1]) - at(-h[0], h[1]) + at(-h[0], -h[1]))
        / (4.0 * h[0] * h[1]);
    [[h00, h01], [h01, h11]]
}

/// Result of [`maximize_2d`].
#[derive(Debug, Clone, Copy)]
pub struct Maximum {
    /// Location of the maximum.
    pub x: [f64; 2],
    /// Objective value at `x`.
    pub value: f64,
    /// Newton iterations used.
    pub iterations: usize,
}

/// Damped Newton ascent for a smooth two-parameter objective.
///
/// Uses the numeric Hessian when it is negative definite and falls back to
/// a scaled gradient step otherwise. Each step is halved until the
/// objective improves, so `f` may return `NaN` or `-∞` outside its domain.
pub fn maximize_2d<F>(f: F, x0: [f64; 2], opts: SolverOptions) -> Option<Maximum>
where
    F: Fn([f64; 2]) -> f64,
{
    let mut x = x0;
    let mut value = f(x);
    if !value.is_finite() {
        return None;
    }

    for iter in 0..opts.max_iterations {
        let g = gradient_2d(&f, x);
        let hess = hessian_2d(&f, x);
        let neg_definite = hess[0][0] < 0.0
            && hess[0][0] * hess[1][1] - hess[0][1] * hess[1][0] > 0.0;

        let dir = match invert_2x2(hess) {
            Some(inv) if neg_definite => [
                -(inv[0][0] * g[0] + inv[0][1] * g[1]),
                -(inv[1][0] * g[0] + inv[1][1] * g[1]),
            ],
            _ => {
                let scale = 0.1 * x[0].abs().max(x[1].abs()).max(1.0)
                    / g[0].abs().max(g[1].abs()).max(1e-12);
                [g[0] * scale, g[1] * scale]
            }
        };

        let mut step = 1.0;
        let mut improved = false;
        for _ in 0..60 {
            let cand = [x[0] + step * dir[0], x[1] + step * dir[1]];
            let v = f(cand);
            if v.is_finite() && v >= value {
                let moved = (cand[0] - x[0]).abs().max((cand[1] - x[1]).abs());
                x = cand;
                let gain = v - value;
                value = v;
                improved = true;
                if moved < opts.tolerance * x[0].abs().max(x[1].abs()).max(1.0)
                    || gain.abs() < opts.tolerance * opts.tolerance
                {
                    return Some(Maximum {
                        x,
                        value,
                        iterations: iter + 1,
                    });
                }
                break;
            }
            step *= 0.5;
        }
        if !improved {
            return Some(Maximum {
                x,
                value,
                iterations: iter + 1,
            });
        }
    }

    Some(Maximum {
        x,
        value,
        iterations: opts.max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn bisect_finds_sqrt2() {
        let root = bisect(|x| x * x - 2.0, 0.0, 2.0, SolverOptions::default()).unwrap();
        assert!(approx_eq(root, 2f64.sqrt(), 1e-9));
    }

    #[test]
    fn bisect_rejects_bad_bracket() {
        assert!(bisect(|x| x * x + 1.0, -1.0, 1.0, SolverOptions::default()).is_none());
    }

    #[test]
    fn bracket_grows_until_sign_change() {
        let f = |x: f64| 50.0 - x;
        let (a, b) = bracket_positive(&f, 1e-6, 1.0, 64).unwrap();
        assert!(f(a) > 0.0 && f(b) < 0.0);
    }

    #[test]
    fn invert_identity_and_singular() {
        let inv = invert_2x2([[2.0, 0.0], [0.0, 4.0]]).unwrap();
        assert!(approx_eq(inv[0][0], 0.5, 1e-15));
        assert!(approx_eq(inv[1][1], 0.25, 1e-15));
        assert!(invert_2x2([[1.0, 2.0], [2.0, 4.0]]).is_none());
    }

    #[test]
    fn hessian_of_quadratic() {
        let f = |x: [f64; 2]| -(3.0 * x[0] * x[0] + 2.0 * x[0] * x[1] + x[1] * x[1]);
        let h = hessian_2d(&f, [0.4, -1.2]);
        assert!(approx_eq(h[0][0], -6.0, 1e-4));
        assert!(approx_eq(h[0][1], -2.0, 1e-4));
        assert!(approx_eq(h[1][1], -2.0, 1e-4));
    }

    #[test]
    fn maximize_concave_quadratic() {
        let f = |x: [f64; 2]| -((x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2));
        let m = maximize_2d(f, [0.0, 0.0], SolverOptions::default()).unwrap();
        assert!(approx_eq(m.x[0], 3.0, 1e-5));
        assert!(approx_eq(m.x[1], -1.0, 1e-5));
    }

    #[test]
    fn maximize_respects_domain() {
        // log-likelihood of a normal sample with mean/sd parameters
        let data = [1.0, 2.0, 2.5, 3.5, 4.0];
        let f = |p: [f64; 2]| {
            if p[1] <= 0.0 {
                return f64::NAN;
            }
            data.iter()
                .map(|&x| -p[1].ln() - 0.5 * ((x - p[0]) / p[1]).powi(2))
                .sum::<f64>()
        };
        let m = maximize_2d(f, [2.0, 2.0], SolverOptions::default()).unwrap();
        assert!(approx_eq(m.x[0], 2.6, 1e-5));
        let var: f64 = data.iter().map(|x| (x - 2.6).powi(2)).sum::<f64>() / 5.0;
        assert!(approx_eq(m.x[1], var.sqrt(), 1e-5));
    }
}
