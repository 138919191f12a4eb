//! Shared pieces of the NHPP reliability-growth models.

use rk_common::{ConfidenceMethod, Error, FitMethod, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::bounds::Bounded;
use super::record::{FailureRecord, GrowthObservation};
use crate::degraded::ratio_or_zero;

/// One growth-table row: cumulative time and failures, then estimates with
/// bounds.
///
/// For the power law `shape` is α = 1 − β and `scale` is b = 1/λ. For the
/// log-linear model they hold γ1 and γ0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthRow {
    pub time: f64,
    pub failures: u32,
    /// `time / failures`.
    pub observed_mtbf: f64,
    pub shape: Bounded,
    pub scale: Bounded,
    pub cumulative_mtbf: Bounded,
    pub instantaneous_mtbf: Bounded,
    pub cumulative_intensity: Bounded,
    pub instantaneous_intensity: Bounded,
}

impl GrowthRow {
    /// Row for a time with no failures yet.
    pub fn empty(time: f64) -> Self {
        let zero = Bounded::exact(0.0);
        Self {
            time,
            failures: 0,
            observed_mtbf: 0.0,
            shape: zero,
            scale: zero,
            cumulative_mtbf: zero,
            instantaneous_mtbf: zero,
            cumulative_intensity: zero,
            instantaneous_intensity: zero,
        }
    }

    /// Flatten to the 21 plotted columns.
    pub fn columns(&self) -> [f64; 21] {
        let mut out = [0.0; 21];
        out[0] = self.time;
        out[1] = self.failures as f64;
        out[2] = self.observed_mtbf;
        let triplets = [
            self.shape,
            self.scale,
            self.cumulative_mtbf,
            self.instantaneous_mtbf,
            self.cumulative_intensity,
            self.instantaneous_intensity,
        ];
        for (i, b) in triplets.iter().enumerate() {
            out[3 + 3 * i..6 + 3 * i].copy_from_slice(&b.as_array());
        }
        out
    }
}

/// Failures grouped by cumulative test time, in time order.
///
/// Pre-aggregated observations win over records; otherwise each failure
/// record contributes its quantity at its time.
pub fn growth_observations(
    cumulative: Option<&[GrowthObservation]>,
    records: &[&FailureRecord],
) -> Vec<GrowthObservation> {
    if let Some(obs) = cumulative {
        let mut obs = obs.to_vec();
        obs.sort_by(|a, b| a.cumulative_time.total_cmp(&b.cumulative_time));
        return obs;
    }
    let mut grouped: BTreeMap<u64, GrowthObservation> = BTreeMap::new();
    for r in records.iter().filter(|r| r.status.is_failure()) {
        let t = r.point_time();
        grouped
            .entry(t.to_bits())
            .or_insert(GrowthObservation {
                cumulative_time: t,
                failures: 0,
            })
            .failures += r.quantity;
    }
    let mut obs: Vec<GrowthObservation> = grouped.into_values().collect();
    obs.sort_by(|a, b| a.cumulative_time.total_cmp(&b.cumulative_time));
    obs
}

/// Reject fit/confidence pairings the power law cannot honour.
pub fn check_power_law_methods(fit: FitMethod, confidence: ConfidenceMethod) -> Result<()> {
    let ok = match fit {
        FitMethod::Mle => matches!(
            confidence,
            ConfidenceMethod::Crow | ConfidenceMethod::FisherMatrix | ConfidenceMethod::Bootstrap
        ),
        FitMethod::RankRegression => confidence == ConfidenceMethod::Duane,
    };
    if ok {
        Ok(())
    } else {
        Err(incompatible(fit, confidence))
    }
}

pub(crate) fn incompatible(fit: FitMethod, confidence: ConfidenceMethod) -> Error {
    Error::IncompatibleMethods {
        fit: fit.to_string(),
        confidence: confidence.to_string(),
    }
}

/// Cramér–von Mises statistic for a power-law fit observed to `end`.
///
/// Uses the unbiased shape `(M − 1) β / M` over the `M` expanded failure
/// times.
pub fn cramer_von_mises(obs: &[GrowthObservation], end: f64, beta: f64) -> f64 {
    let times: Vec<f64> = obs
        .iter()
        .flat_map(|o| std::iter::repeat_n(o.cumulative_time, o.failures as usize))
        .collect();
    let m = times.len() as f64;
    if times.is_empty() || !(end > 0.0) {
        return 0.0;
    }
    let beta_bar = (m - 1.0) * beta / m;
    let sum: f64 = times
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let expected = (2.0 * i as f64 + 1.0) / (2.0 * m);
            ((t / end).powf(beta_bar) - expected).powi(2)
        })
        .sum();
    ratio_or_zero(1.0, 12.0 * m, "cramer_von_mises") + sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_group_by_time() {
        let records = vec![
            FailureRecord::event("a", 10.0),
            FailureRecord::event("b", 10.0).with_quantity(2),
            FailureRecord::censored("c", 15.0),
            FailureRecord::event("d", 30.0),
        ];
        let refs: Vec<&FailureRecord> = records.iter().collect();
        let obs = growth_observations(None, &refs);
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].failures, 3);
        assert_eq!(obs[1].cumulative_time, 30.0);
    }

    #[test]
    fn method_pairings() {
        assert!(check_power_law_methods(FitMethod::Mle, ConfidenceMethod::Crow).is_ok());
        assert!(check_power_law_methods(FitMethod::Mle, ConfidenceMethod::Bootstrap).is_ok());
        assert!(check_power_law_methods(FitMethod::RankRegression, ConfidenceMethod::Duane).is_ok());
        assert!(matches!(
            check_power_law_methods(FitMethod::RankRegression, ConfidenceMethod::Crow),
            Err(Error::IncompatibleMethods { .. })
        ));
        assert!(check_power_law_methods(FitMethod::Mle, ConfidenceMethod::Likelihood).is_err());
    }

    #[test]
    fn columns_flatten_in_order() {
        let mut row = GrowthRow::empty(100.0);
        row.failures = 4;
        row.observed_mtbf = 25.0;
        row.instantaneous_intensity = Bounded::new(1.0, 2.0, 3.0);
        let c = row.columns();
        assert_eq!(c[0], 100.0);
        assert_eq!(c[1], 4.0);
        assert_eq!(&c[18..21], &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn cvm_of_perfect_uniform_fit_is_small() {
        let obs: Vec<GrowthObservation> = (0..10)
            .map(|i| GrowthObservation {
                cumulative_time: (2 * i + 1) as f64 * 5.0,
                failures: 1,
            })
            .collect();
        // shape 10/9 makes the unbiased exponent exactly one
        let c = cramer_von_mises(&obs, 100.0, 10.0 / 9.0);
        assert!((c - 1.0 / 120.0).abs() < 1e-12);
    }
}
