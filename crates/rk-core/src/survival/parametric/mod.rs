//! Parametric life-distribution fits.
//!
//! Each distribution exposes its log-density and CDF through [`LifeModel`];
//! the shared code here turns those into a censored log-likelihood, a
//! median-rank plot for regression, and the [`FitResult`] with log-transform
//! bounds.

pub mod exponential;
pub mod lognormal;
pub mod normal;
pub mod weibull;

use rk_common::{Distribution, Error, FitMethod, Result};
use rk_math::optimize::{hessian_2d, invert_2x2};
use rk_math::regression::ols;
use rk_math::LinearFit;
use serde::{Deserialize, Serialize};

use super::bounds::Bounded;
use super::record::{AnalysisOptions, FailureRecord, RecordStatus};
use crate::context::CalculationContext;
use crate::degraded::finite_or_zero;

/// A life distribution with known log-density and CDF.
pub trait LifeModel {
    fn log_pdf(&self, t: f64) -> f64;
    fn cdf(&self, t: f64) -> f64;

    fn sf(&self, t: f64) -> f64 {
        1.0 - self.cdf(t)
    }

    /// Reliability at `t`.
    fn reliability(&self, t: f64) -> f64 {
        self.sf(t)
    }

    /// Mean life.
    fn mean(&self) -> f64;
}

/// Censored observation in the form the likelihood needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    Exact(f64),
    Right(f64),
    Left(f64),
    Interval(f64, f64),
}

/// Weighted observations extracted from dataset records.
#[derive(Debug, Clone, PartialEq)]
pub struct LifeData {
    pub observations: Vec<(Observation, f64)>,
}

impl LifeData {
    pub fn from_records(records: &[&FailureRecord]) -> Self {
        let observations = records
            .iter()
            .map(|r| {
                let obs = match r.status {
                    RecordStatus::Event => Observation::Exact(r.right),
                    RecordStatus::RightCensored => Observation::Right(r.right),
                    RecordStatus::LeftCensored => Observation::Left(r.right),
                    RecordStatus::IntervalCensored if r.right > r.left => {
                        Observation::Interval(r.left, r.right)
                    }
                    RecordStatus::IntervalCensored => Observation::Exact(r.right),
                };
                (obs, r.quantity as f64)
            })
            .collect();
        Self { observations }
    }

    /// Total weight (units).
    pub fn units(&self) -> f64 {
        self.observations.iter().map(|(_, w)| w).sum()
    }

    /// Total weight of failures.
    pub fn failures(&self) -> f64 {
        self.observations
            .iter()
            .filter(|(o, _)| !matches!(o, Observation::Right(_)))
            .map(|(_, w)| w)
            .sum()
    }

    /// Representative failure times with weights.
    pub fn failure_times(&self) -> Vec<(f64, f64)> {
        self.observations
            .iter()
            .filter_map(|(o, w)| match o {
                Observation::Exact(t) | Observation::Left(t) => Some((*t, *w)),
                Observation::Interval(l, r) => Some((0.5 * (l + r), *w)),
                Observation::Right(_) => None,
            })
            .collect()
    }

    /// Censored log-likelihood of `model`.
    pub fn log_likelihood<M: LifeModel>(&self, model: &M) -> f64 {
        self.observations
            .iter()
            .map(|(o, w)| {
                let ll = match *o {
                    Observation::Exact(t) => model.log_pdf(t),
                    Observation::Right(t) => model.sf(t).ln(),
                    Observation::Left(t) => model.cdf(t).ln(),
                    Observation::Interval(l, r) => (model.cdf(r) - model.cdf(l)).ln(),
                };
                w * ll
            })
            .sum()
    }

    /// Require at least `min` failures for a fit.
    pub fn require_failures(&self, min: f64, what: &str) -> Result<()> {
        let f = self.failures();
        if f < min {
            return Err(Error::InsufficientData(format!(
                "{} fit needs at least {} failures, got {}",
                what, min, f
            )));
        }
        Ok(())
    }
}

/// Median-rank plotting positions for failures, adjusted for suspensions
/// (Johnson's method with Bernard's approximation).
///
/// Returns `(time, F̂)` pairs in time order.
pub fn median_ranks(data: &LifeData) -> Vec<(f64, f64)> {
    let mut items: Vec<(f64, bool, f64)> = data
        .observations
        .iter()
        .map(|(o, w)| match *o {
            Observation::Exact(t) | Observation::Left(t) => (t, true, *w),
            Observation::Interval(l, r) => (0.5 * (l + r), true, *w),
            Observation::Right(t) => (t, false, *w),
        })
        .collect();
    items.sort_by(|a, b| a.0.total_cmp(&b.0).then(b.1.cmp(&a.1)));

    let n: f64 = items.iter().map(|i| i.2).sum();
    let mut remaining = n;
    let mut prev_rank = 0.0;
    let mut out = Vec::new();
    for (t, failed, w) in items {
        if failed {
            let mut k = 0.0;
            while k < w {
                let increment = (n + 1.0 - prev_rank) / (1.0 + remaining);
                prev_rank += increment;
                remaining -= 1.0;
                out.push((t, (prev_rank - 0.3) / (n + 0.4)));
                k += 1.0;
            }
        } else {
            remaining -= w;
        }
    }
    out
}

/// Least-squares line through the transformed median-rank plot.
///
/// Points whose transformed coordinates are not finite are skipped.
pub(crate) fn rank_regression(
    data: &LifeData,
    x: impl Fn(f64) -> f64,
    y: impl Fn(f64) -> f64,
) -> Option<LinearFit> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = median_ranks(data)
        .into_iter()
        .map(|(t, f)| (x(t), y(f)))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .unzip();
    ols(&xs, &ys)
}

pub(crate) fn not_converged(what: &str) -> Error {
    Error::InsufficientData(format!("{} likelihood has no finite maximum", what))
}

/// Fitted parameters with bounds, variances and information criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub distribution: Distribution,
    pub fit_method: FitMethod,
    pub scale: Bounded,
    pub shape: Bounded,
    pub location: Bounded,
    /// Variances of scale, shape and location.
    pub variance: [f64; 3],
    /// Covariances scale-shape, scale-location, shape-location.
    pub covariance: [f64; 3],
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    /// Mean life with bounds from the scale bounds.
    pub mtbf: Bounded,
    pub n_failures: f64,
    pub n_suspensions: f64,
}

/// Raw estimates before bounds are attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Estimate {
    pub scale: f64,
    pub shape: f64,
    pub location: f64,
    pub variance: [f64; 3],
    pub covariance: [f64; 3],
    pub log_likelihood: f64,
    /// Free parameters.
    pub k: usize,
}

/// Observed-information covariance of two natural parameters.
///
/// Returns `(var_a, var_b, cov_ab)`, or zeros when the information matrix
/// is singular.
pub(crate) fn observed_covariance<F>(loglik: F, x: [f64; 2]) -> (f64, f64, f64)
where
    F: Fn([f64; 2]) -> f64,
{
    let h = hessian_2d(&loglik, x);
    let info = [[-h[0][0], -h[0][1]], [-h[1][0], -h[1][1]]];
    match invert_2x2(info) {
        Some(cov) => (
            finite_or_zero(cov[0][0], "variance"),
            finite_or_zero(cov[1][1], "variance"),
            finite_or_zero(cov[0][1], "covariance"),
        ),
        None => {
            tracing::warn!(
                event = crate::logging::event_names::RESULT_DEGRADED,
                quantity = "fisher_matrix",
                "singular information matrix; variances set to zero"
            );
            (0.0, 0.0, 0.0)
        }
    }
}

impl Estimate {
    /// Attach log-transform bounds and information criteria.
    pub fn into_result<M: LifeModel>(
        self,
        distribution: Distribution,
        opts: &AnalysisOptions,
        data: &LifeData,
        model_at: impl Fn(f64) -> M,
    ) -> FitResult {
        let z = opts.z();
        let scale = Bounded::log_transform(self.scale, self.variance[0], z, "scale");
        let shape = if self.k > 1 && distribution != Distribution::Normal {
            Bounded::log_transform(self.shape, self.variance[1], z, "shape")
        } else {
            Bounded::exact(self.shape)
        };
        let location = if distribution == Distribution::Normal {
            Bounded::symmetric(self.location, self.variance[2], z, "location")
        } else {
            Bounded::exact(self.location)
        };

        let mtbf = if distribution == Distribution::Normal {
            location
        } else {
            Bounded::new(
                model_at(scale.lower).mean(),
                model_at(scale.point).mean(),
                model_at(scale.upper).mean(),
            )
        };

        let n = data.units();
        let k = self.k as f64;
        let ll = self.log_likelihood;
        FitResult {
            distribution,
            fit_method: opts.fit_method,
            scale,
            shape,
            location,
            variance: self.variance,
            covariance: self.covariance,
            log_likelihood: ll,
            aic: 2.0 * k - 2.0 * ll,
            bic: k * n.max(1.0).ln() - 2.0 * ll,
            mtbf: mtbf.map(|m| finite_or_zero(m, "mtbf")),
            n_failures: data.failures(),
            n_suspensions: n - data.failures(),
        }
    }
}

/// Fit `distribution` to the windowed records.
pub fn fit(
    distribution: Distribution,
    records: &[&FailureRecord],
    opts: &AnalysisOptions,
    ctx: &CalculationContext,
) -> Result<FitResult> {
    let data = LifeData::from_records(records);
    let solver = ctx.solver_options();
    match distribution {
        Distribution::Exponential => {
            let est = exponential::estimate(&data, opts.fit_method, solver)?;
            Ok(est.into_result(distribution, opts, &data, exponential::Exponential::new))
        }
        Distribution::Weibull => {
            let est = weibull::estimate(&data, opts.fit_method, solver)?;
            let shape = est.shape;
            Ok(est.into_result(distribution, opts, &data, |scale| {
                weibull::Weibull::new(scale, shape)
            }))
        }
        Distribution::Lognormal => {
            let est = lognormal::estimate(&data, opts.fit_method, solver)?;
            let shape = est.shape;
            Ok(est.into_result(distribution, opts, &data, |scale| {
                lognormal::Lognormal::new(scale, shape)
            }))
        }
        Distribution::Normal => {
            let est = normal::estimate(&data, opts.fit_method, solver)?;
            let location = est.location;
            Ok(est.into_result(distribution, opts, &data, |scale| {
                normal::Normal::new(location, scale)
            }))
        }
        other => Err(Error::invalid(
            "distribution",
            format!("{} is not a parametric life distribution", other),
        )),
    }
}
