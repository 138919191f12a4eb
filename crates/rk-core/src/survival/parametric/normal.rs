//! Normal life model. `location` is μ, `scale` is σ.

use rk_common::{FitMethod, Result};
use rk_math::optimize::{maximize_2d, SolverOptions};
use rk_math::{normal_cdf, normal_log_pdf, normal_ppf, normal_sf};

use super::{not_converged, observed_covariance, rank_regression, Estimate, LifeData, LifeModel};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    pub mu: f64,
    pub sigma: f64,
}

impl Normal {
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    fn z(&self, t: f64) -> f64 {
        (t - self.mu) / self.sigma
    }
}

impl LifeModel for Normal {
    fn log_pdf(&self, t: f64) -> f64 {
        normal_log_pdf(self.z(t)) - self.sigma.ln()
    }

    fn cdf(&self, t: f64) -> f64 {
        normal_cdf(self.z(t))
    }

    fn sf(&self, t: f64) -> f64 {
        normal_sf(self.z(t))
    }

    fn mean(&self) -> f64 {
        self.mu
    }
}

fn regression_estimate(data: &LifeData) -> Option<(f64, f64)> {
    let fit = rank_regression(data, |t| t, normal_ppf)?;
    if !(fit.slope > 0.0) {
        return None;
    }
    let sigma = 1.0 / fit.slope;
    Some((-fit.intercept * sigma, sigma))
}

fn moments(data: &LifeData) -> (f64, f64) {
    let times = data.failure_times();
    let w: f64 = times.iter().map(|(_, w)| w).sum::<f64>().max(1.0);
    let mu = times.iter().map(|(t, w)| w * t).sum::<f64>() / w;
    let var = times.iter().map(|(t, w)| w * (t - mu).powi(2)).sum::<f64>() / w;
    (mu, var.sqrt().max(mu.abs() * 1e-3).max(1e-6))
}

pub(crate) fn estimate(data: &LifeData, method: FitMethod, solver: SolverOptions) -> Result<Estimate> {
    data.require_failures(2.0, "normal")?;
    let start = regression_estimate(data);

    let (mu, sigma) = match method {
        FitMethod::RankRegression => start.ok_or_else(|| not_converged("normal"))?,
        FitMethod::Mle => {
            let (m0, s0) = start.unwrap_or_else(|| moments(data));
            let max = maximize_2d(
                |p| data.log_likelihood(&Normal::new(p[0], p[1].exp())),
                [m0, s0.ln()],
                solver,
            )
            .ok_or_else(|| not_converged("normal"))?;
            (max.x[0], max.x[1].exp())
        }
    };

    let (var_sigma, var_mu, cov) = observed_covariance(
        |p| data.log_likelihood(&Normal::new(p[1], p[0])),
        [sigma, mu],
    );

    Ok(Estimate {
        scale: sigma,
        shape: 0.0,
        location: mu,
        variance: [var_sigma, 0.0, var_mu],
        covariance: [0.0, cov, 0.0],
        log_likelihood: data.log_likelihood(&Normal::new(mu, sigma)),
        k: 2,
    })
}
