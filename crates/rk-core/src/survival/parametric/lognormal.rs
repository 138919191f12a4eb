//! Lognormal life model. `scale` is the median `e^μ`, `shape` is σ.

use rk_common::{FitMethod, Result};
use rk_math::optimize::{maximize_2d, SolverOptions};
use rk_math::{normal_cdf, normal_log_pdf, normal_ppf, normal_sf};

use super::{not_converged, observed_covariance, rank_regression, Estimate, LifeData, LifeModel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lognormal {
    pub mu: f64,
    pub sigma: f64,
}

impl Lognormal {
    /// Build from the median and σ.
    pub fn new(scale: f64, sigma: f64) -> Self {
        Self {
            mu: scale.ln(),
            sigma,
        }
    }

    fn z(&self, t: f64) -> f64 {
        (t.ln() - self.mu) / self.sigma
    }
}

impl LifeModel for Lognormal {
    fn log_pdf(&self, t: f64) -> f64 {
        normal_log_pdf(self.z(t)) - (t * self.sigma).ln()
    }

    fn cdf(&self, t: f64) -> f64 {
        normal_cdf(self.z(t))
    }

    fn sf(&self, t: f64) -> f64 {
        normal_sf(self.z(t))
    }

    fn mean(&self) -> f64 {
        (self.mu + 0.5 * self.sigma * self.sigma).exp()
    }
}

/// `Φ⁻¹(F)` against `ln t`: slope `1/σ`, intercept `−μ/σ`.
fn regression_estimate(data: &LifeData) -> Option<(f64, f64)> {
    let fit = rank_regression(data, f64::ln, normal_ppf)?;
    if !(fit.slope > 0.0) {
        return None;
    }
    let sigma = 1.0 / fit.slope;
    Some((-fit.intercept * sigma, sigma))
}

fn log_moments(data: &LifeData) -> (f64, f64) {
    let times = data.failure_times();
    let w: f64 = times.iter().map(|(_, w)| w).sum::<f64>().max(1.0);
    let mu = times.iter().map(|(t, w)| w * t.ln()).sum::<f64>() / w;
    let var = times
        .iter()
        .map(|(t, w)| w * (t.ln() - mu).powi(2))
        .sum::<f64>()
        / w;
    (mu, var.sqrt().max(0.1))
}

pub(crate) fn estimate(data: &LifeData, method: FitMethod, solver: SolverOptions) -> Result<Estimate> {
    data.require_failures(2.0, "lognormal")?;
    let start = regression_estimate(data);

    let (mu, sigma) = match method {
        FitMethod::RankRegression => start.ok_or_else(|| not_converged("lognormal"))?,
        FitMethod::Mle => {
            let (m0, s0) = start.unwrap_or_else(|| log_moments(data));
            let max = maximize_2d(
                |p| data.log_likelihood(&Lognormal { mu: p[0], sigma: p[1].exp() }),
                [m0, s0.ln()],
                solver,
            )
            .ok_or_else(|| not_converged("lognormal"))?;
            (max.x[0], max.x[1].exp())
        }
    };

    let (var_mu, var_sigma, cov) = observed_covariance(
        |p| data.log_likelihood(&Lognormal { mu: p[0], sigma: p[1] }),
        [mu, sigma],
    );
    // delta method for the median e^μ
    let median = mu.exp();

    Ok(Estimate {
        scale: median,
        shape: sigma,
        location: 0.0,
        variance: [median * median * var_mu, var_sigma, 0.0],
        covariance: [median * cov, 0.0, 0.0],
        log_likelihood: data.log_likelihood(&Lognormal { mu, sigma }),
        k: 2,
    })
}
