//! Ordinary least squares on a single regressor.
//!
//! Rank-regression fits for the life distributions and the Duane growth
//! model both reduce to a straight line through transformed points.

use serde::{Deserialize, Serialize};

/// Least-squares line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Slope of the fitted line.
    pub slope: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Number of points used.
    pub n: usize,
    /// Σ (x - x̄)².
    pub sxx: f64,
    /// Residual sum of squares.
    pub sse: f64,
    /// Mean of x.
    pub x_mean: f64,
}

impl LinearFit {
    /// Residual variance `SSE / (n - 2)`, or `None` with fewer than three points.
    pub fn residual_variance(&self) -> Option<f64> {
        if self.n < 3 {
            return None;
        }
        Some(self.sse / (self.n as f64 - 2.0))
    }

    /// Standard error of the slope.
    pub fn slope_std_err(&self) -> Option<f64> {
        let s2 = self.residual_variance()?;
        if self.sxx <= 0.0 {
            return None;
        }
        Some((s2 / self.sxx).sqrt())
    }

    /// Standard error of the intercept.
    pub fn intercept_std_err(&self) -> Option<f64> {
        let s2 = self.residual_variance()?;
        if self.sxx <= 0.0 {
            return None;
        }
        let n = self.n as f64;
        Some((s2 * (1.0 / n + self.x_mean * self.x_mean / self.sxx)).sqrt())
    }
}

/// Fit `y` on `x` by ordinary least squares.
///
/// Returns `None` for mismatched lengths, fewer than two points, or
/// constant `x`.
pub fn ols(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }
    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx < 1e-300 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let sse = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - intercept - slope * xi).powi(2))
        .sum::<f64>();
    let r_squared = if syy > 0.0 { 1.0 - sse / syy } else { 1.0 };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
        n,
        sxx,
        sse,
        x_mean,
    })
}
