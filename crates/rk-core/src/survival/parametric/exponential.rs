//! One-parameter exponential life model; `scale` carries the failure rate.

use rk_common::{FitMethod, Result};
use rk_math::optimize::{bisect, bracket_positive, SolverOptions};

use super::{not_converged, median_ranks, Estimate, LifeData, LifeModel, Observation};
use crate::degraded::ratio_or_zero;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    pub rate: f64,
}

impl Exponential {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl LifeModel for Exponential {
    fn log_pdf(&self, t: f64) -> f64 {
        self.rate.ln() - self.rate * t
    }

    fn cdf(&self, t: f64) -> f64 {
        -(-self.rate * t).exp_m1()
    }

    fn sf(&self, t: f64) -> f64 {
        (-self.rate * t).exp()
    }

    fn mean(&self) -> f64 {
        ratio_or_zero(1.0, self.rate, "exponential.mean")
    }
}

/// Total exposure time, counting interval failures at their midpoint.
fn exposure(data: &LifeData) -> f64 {
    data.observations
        .iter()
        .map(|(o, w)| {
            w * match *o {
                Observation::Exact(t) | Observation::Right(t) | Observation::Left(t) => t,
                Observation::Interval(l, r) => 0.5 * (l + r),
            }
        })
        .sum()
}

fn exact_or_right_only(data: &LifeData) -> bool {
    data.observations
        .iter()
        .all(|(o, _)| matches!(o, Observation::Exact(_) | Observation::Right(_)))
}

/// Maximum-likelihood rate by bisection on the numeric score.
fn mle_rate(data: &LifeData, start: f64, solver: SolverOptions) -> Option<f64> {
    let ll = |rate: f64| data.log_likelihood(&Exponential::new(rate));
    let score = |rate: f64| {
        let h = 1e-6 * rate;
        (ll(rate + h) - ll(rate - h)) / (2.0 * h)
    };
    let (lo, hi) = bracket_positive(&score, start * 1e-3, start, 60)?;
    bisect(score, lo, hi, solver)
}

pub(crate) fn estimate(data: &LifeData, method: FitMethod, solver: SolverOptions) -> Result<Estimate> {
    data.require_failures(1.0, "exponential")?;
    let r = data.failures();
    let closed_form = ratio_or_zero(r, exposure(data), "exponential.rate");

    let rate = match method {
        FitMethod::Mle if exact_or_right_only(data) => closed_form,
        FitMethod::Mle => {
            mle_rate(data, closed_form, solver).ok_or_else(|| not_converged("exponential"))?
        }
        FitMethod::RankRegression => {
            // −ln(1 − F) = λt, least squares through the origin
            let (sty, stt) = median_ranks(data)
                .into_iter()
                .fold((0.0, 0.0), |(sty, stt), (t, f)| {
                    (sty - t * (-f).ln_1p(), stt + t * t)
                });
            ratio_or_zero(sty, stt, "exponential.rate")
        }
    };

    Ok(Estimate {
        scale: rate,
        shape: 0.0,
        location: 0.0,
        variance: [rate * rate / r, 0.0, 0.0],
        covariance: [0.0; 3],
        log_likelihood: data.log_likelihood(&Exponential::new(rate)),
        k: 1,
    })
}
