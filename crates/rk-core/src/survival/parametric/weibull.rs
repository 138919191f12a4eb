//! Two-parameter Weibull life model.

use rk_common::{FitMethod, Result};
use rk_math::gamma_fn;
use rk_math::optimize::{maximize_2d, SolverOptions};

use super::{not_converged, observed_covariance, rank_regression, Estimate, LifeData, LifeModel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weibull {
    /// Characteristic life η.
    pub scale: f64,
    /// Shape β.
    pub shape: f64,
}

impl Weibull {
    pub fn new(scale: f64, shape: f64) -> Self {
        Self { scale, shape }
    }

    fn cumulative_hazard(&self, t: f64) -> f64 {
        (t / self.scale).powf(self.shape)
    }
}

impl LifeModel for Weibull {
    fn log_pdf(&self, t: f64) -> f64 {
        let z = t / self.scale;
        self.shape.ln() - self.scale.ln() + (self.shape - 1.0) * z.ln() - z.powf(self.shape)
    }

    fn cdf(&self, t: f64) -> f64 {
        -(-self.cumulative_hazard(t)).exp_m1()
    }

    fn sf(&self, t: f64) -> f64 {
        (-self.cumulative_hazard(t)).exp()
    }

    fn mean(&self) -> f64 {
        self.scale * gamma_fn(1.0 + 1.0 / self.shape)
    }
}

/// Least-squares line of `ln(−ln(1 − F))` on `ln t`; slope is β.
fn regression_estimate(data: &LifeData) -> Option<(f64, f64)> {
    let fit = rank_regression(data, f64::ln, |f| (-(-f).ln_1p()).ln())?;
    let shape = fit.slope;
    if !(shape > 0.0) {
        return None;
    }
    Some(((-fit.intercept / shape).exp(), shape))
}

/// Starting point when the rank plot is degenerate.
fn moment_start(data: &LifeData) -> (f64, f64) {
    let times = data.failure_times();
    let w: f64 = times.iter().map(|(_, w)| w).sum();
    let mean = times.iter().map(|(t, w)| t * w).sum::<f64>() / w.max(1.0);
    (mean.max(f64::MIN_POSITIVE), 1.0)
}

pub(crate) fn estimate(data: &LifeData, method: FitMethod, solver: SolverOptions) -> Result<Estimate> {
    data.require_failures(2.0, "Weibull")?;
    let start = regression_estimate(data);

    let (scale, shape) = match method {
        FitMethod::RankRegression => start.ok_or_else(|| not_converged("Weibull"))?,
        FitMethod::Mle => {
            let (s0, b0) = start.unwrap_or_else(|| moment_start(data));
            let max = maximize_2d(
                |p| data.log_likelihood(&Weibull::new(p[0].exp(), p[1].exp())),
                [s0.ln(), b0.ln()],
                solver,
            )
            .ok_or_else(|| not_converged("Weibull"))?;
            (max.x[0].exp(), max.x[1].exp())
        }
    };

    let (var_scale, var_shape, cov) = observed_covariance(
        |p| data.log_likelihood(&Weibull::new(p[0], p[1])),
        [scale, shape],
    );

    Ok(Estimate {
        scale,
        shape,
        location: 0.0,
        variance: [var_scale, var_shape, 0.0],
        covariance: [cov, 0.0, 0.0],
        log_likelihood: data.log_likelihood(&Weibull::new(scale, shape)),
        k: 2,
    })
}
