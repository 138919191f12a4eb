//! Trend tests for a pooled sequence of event times.
//!
//! All four tests are two-sided at significance `1 - confidence` and say
//! whether the failure intensity looks constant over the observation window.
//! MIL-HDBK-189 and Laplace read the pooled times; Lewis–Robinson and the
//! serial correlation read interarrival gaps, which callers with unit
//! histories compute per unit.

use rk_math::{chi2_cdf, chi2_ppf, chi2_sf, normal_ppf, normal_sf};
use serde::{Deserialize, Serialize};

use crate::degraded::ratio_or_zero;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Constant,
    Nonconstant,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Constant => write!(f, "Constant"),
            Verdict::Nonconstant => write!(f, "Nonconstant"),
        }
    }
}

/// Outcome of one trend test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendTest {
    pub statistic: f64,
    pub critical_value: f64,
    pub p_value: f64,
    pub verdict: Verdict,
}

impl TrendTest {
    /// Placeholder for a test the data cannot support.
    fn inconclusive(critical_value: f64) -> Self {
        Self {
            statistic: 0.0,
            critical_value,
            p_value: 1.0,
            verdict: Verdict::Constant,
        }
    }

    /// Two-sided standard-normal test.
    fn normal(statistic: f64, z_crit: f64) -> Self {
        let p_value = (2.0 * normal_sf(statistic.abs())).min(1.0);
        Self {
            statistic,
            critical_value: z_crit,
            p_value,
            verdict: if statistic.abs() > z_crit {
                Verdict::Nonconstant
            } else {
                Verdict::Constant
            },
        }
    }
}

/// The four trend tests reported with an MCF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendTests {
    pub mil_hdbk: TrendTest,
    pub laplace: TrendTest,
    pub lewis_robinson: TrendTest,
    pub serial_correlation: TrendTest,
}

/// Event times truncated at the end of observation.
struct Truncated<'a> {
    /// Times contributing to the statistics.
    times: &'a [f64],
    end: f64,
}

/// Drop the final event when the test is failure-terminated.
fn truncate(times: &[f64], end: f64) -> Truncated<'_> {
    match times.last() {
        Some(&last) if last >= end => Truncated {
            times: &times[..times.len() - 1],
            end: last,
        },
        _ => Truncated { times, end },
    }
}

/// MIL-HDBK-189 test: `2 Σ ln(T / tᵢ)` against χ² with `2n` degrees of freedom.
pub fn mil_hdbk(times: &[f64], end: f64, confidence: f64) -> TrendTest {
    let t = truncate(times, end);
    let n = t.times.len();
    let alpha = 1.0 - confidence;
    if n == 0 || !(t.end > 0.0) {
        return TrendTest::inconclusive(0.0);
    }
    let dof = 2.0 * n as f64;
    let statistic: f64 = 2.0 * t.times.iter().map(|ti| (t.end / ti).ln()).sum::<f64>();
    let lower = chi2_ppf(alpha / 2.0, dof);
    let upper = chi2_ppf(1.0 - alpha / 2.0, dof);
    let p_value = (2.0 * chi2_cdf(statistic, dof).min(chi2_sf(statistic, dof))).min(1.0);
    TrendTest {
        statistic,
        critical_value: upper,
        p_value,
        verdict: if statistic < lower || statistic > upper {
            Verdict::Nonconstant
        } else {
            Verdict::Constant
        },
    }
}

/// Laplace centroid statistic `(Σ tᵢ / n − T/2) / (T √(1 / 12n))`.
pub fn laplace(times: &[f64], end: f64, confidence: f64) -> TrendTest {
    let z_crit = normal_ppf(1.0 - (1.0 - confidence) / 2.0);
    let t = truncate(times, end);
    let n = t.times.len() as f64;
    if n == 0.0 {
        return TrendTest::inconclusive(z_crit);
    }
    let mean = t.times.iter().sum::<f64>() / n;
    let statistic = ratio_or_zero(
        mean - t.end / 2.0,
        t.end * (1.0 / (12.0 * n)).sqrt(),
        "laplace",
    );
    TrendTest::normal(statistic, z_crit)
}

/// Interarrival gaps of sorted event times, measured from zero.
pub fn pooled_gaps(times: &[f64]) -> Vec<f64> {
    let mut prev = 0.0;
    times
        .iter()
        .map(|&t| {
            let g = t - prev;
            prev = t;
            g
        })
        .collect()
}

fn mean_and_sd(x: &[f64]) -> Option<(f64, f64)> {
    if x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, var.sqrt()))
}

/// Lewis–Robinson: Laplace's statistic divided by the interarrival
/// coefficient of variation.
pub fn lewis_robinson(times: &[f64], gaps: &[f64], end: f64, confidence: f64) -> TrendTest {
    let lp = laplace(times, end, confidence);
    let z_crit = lp.critical_value;
    let Some((mean, sd)) = mean_and_sd(gaps) else {
        return TrendTest::inconclusive(z_crit);
    };
    let cv = ratio_or_zero(sd, mean, "lewis_robinson.cv");
    let statistic = ratio_or_zero(lp.statistic, cv, "lewis_robinson");
    TrendTest::normal(statistic, z_crit)
}

/// Lag-1 serial correlation of interarrival gaps, scaled by `√(n−1)`.
pub fn serial_correlation(gaps: &[f64], confidence: f64) -> TrendTest {
    let z_crit = normal_ppf(1.0 - (1.0 - confidence) / 2.0);
    let x = gaps;
    if x.len() < 3 {
        return TrendTest::inconclusive(z_crit);
    }
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let num: f64 = x
        .windows(2)
        .map(|w| (w[0] - mean) * (w[1] - mean))
        .sum();
    let den: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    let rho = ratio_or_zero(num, den, "serial_correlation");
    TrendTest::normal(rho * (n - 1.0).sqrt(), z_crit)
}

/// Run all four tests. `times` must be sorted ascending; `gaps` are the
/// interarrival times in arrival order.
pub fn trend_tests(times: &[f64], gaps: &[f64], end: f64, confidence: f64) -> TrendTests {
    TrendTests {
        mil_hdbk: mil_hdbk(times, end, confidence),
        laplace: laplace(times, end, confidence),
        lewis_robinson: lewis_robinson(times, gaps, end, confidence),
        serial_correlation: serial_correlation(gaps, confidence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hpp_times() -> Vec<f64> {
        // evenly spread arrivals look like a homogeneous process
        (1..=20).map(|i| i as f64 * 50.0 - 25.0).collect()
    }

    #[test]
    fn homogeneous_arrivals_are_constant() {
        let times = hpp_times();
        let tests = trend_tests(&times, &pooled_gaps(&times), 1000.0, 0.9);
        assert_eq!(tests.laplace.verdict, Verdict::Constant);
        assert!(tests.laplace.statistic.abs() < 1e-9);
        assert_eq!(tests.mil_hdbk.verdict, Verdict::Constant);
    }

    #[test]
    fn late_clustering_is_nonconstant() {
        let times: Vec<f64> = (1..=15).map(|i| 900.0 + i as f64 * 6.0).collect();
        let tests = trend_tests(&times, &pooled_gaps(&times), 1000.0, 0.9);
        assert_eq!(tests.laplace.verdict, Verdict::Nonconstant);
        assert!(tests.laplace.statistic > 0.0);
        assert_eq!(tests.mil_hdbk.verdict, Verdict::Nonconstant);
        assert!(tests.mil_hdbk.p_value < 0.1);
    }

    #[test]
    fn failure_terminated_drops_last_event() {
        let times = vec![100.0, 300.0, 600.0, 1000.0];
        let t = mil_hdbk(&times, 1000.0, 0.9);
        let expected = 2.0 * (10.0f64.ln() + (1000.0f64 / 300.0).ln() + (1000.0f64 / 600.0).ln());
        assert!((t.statistic - expected).abs() < 1e-12);
    }

    #[test]
    fn too_few_events_are_inconclusive() {
        let t = serial_correlation(&pooled_gaps(&[10.0, 20.0]), 0.9);
        assert_eq!(t.p_value, 1.0);
        assert_eq!(t.verdict, Verdict::Constant);
        let t = mil_hdbk(&[], 100.0, 0.9);
        assert_eq!(t.statistic, 0.0);
    }

    #[test]
    fn lewis_robinson_scales_laplace() {
        let times = vec![10.0, 40.0, 45.0, 90.0, 200.0, 210.0];
        let lp = laplace(&times, 300.0, 0.9);
        let lr = lewis_robinson(&times, &pooled_gaps(&times), 300.0, 0.9);
        assert!(lp.statistic.signum() == lr.statistic.signum());
    }

    #[test]
    fn gap_tests_read_the_supplied_gaps() {
        let times = vec![10.0, 40.0, 45.0, 90.0, 200.0, 210.0];
        // two units with identical histories: no pooled interleaving
        let per_unit = [10.0, 30.0, 5.0, 10.0, 30.0, 5.0];
        let lr = lewis_robinson(&times, &per_unit, 300.0, 0.9);
        let (mean, sd) = mean_and_sd(&per_unit).unwrap();
        let lp = laplace(&times, 300.0, 0.9);
        assert!((lr.statistic - lp.statistic / (sd / mean)).abs() < 1e-12);
        assert_ne!(
            serial_correlation(&per_unit, 0.9).statistic,
            serial_correlation(&pooled_gaps(&times), 0.9).statistic
        );
    }
}
