//! Kaplan–Meier product-limit estimator and derived hazard curves.

use serde::{Deserialize, Serialize};

use super::bounds::Bounded;
use super::record::FailureRecord;
use crate::degraded::{finite_or_zero, ratio_or_zero};

/// Survival estimate at one distinct failure time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KaplanMeierPoint {
    pub time: f64,
    pub at_risk: u32,
    pub failures: u32,
    pub survival: Bounded,
    /// Average hazard `H(t) / t`.
    pub hazard: Bounded,
    /// Cumulative hazard `H(t) = −ln S(t)`.
    pub cumulative_hazard: Bounded,
    /// `ln H(t)`; zero where `H(t)` is zero.
    pub log_cumulative_hazard: Bounded,
}

/// Product-limit curve plus the restricted mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KaplanMeierResult {
    pub points: Vec<KaplanMeierPoint>,
    /// Restricted mean survival time over the observed range.
    pub mean: Bounded,
}

/// Group records into `(time, failures, censored)` rows sorted by time.
fn tabulate(records: &[&FailureRecord]) -> Vec<(f64, u32, u32)> {
    let mut rows: Vec<(f64, u32, u32)> = Vec::new();
    let mut sorted: Vec<(f64, bool, u32)> = records
        .iter()
        .map(|r| (r.point_time(), r.status.is_failure(), r.quantity))
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (t, failed, q) in sorted {
        match rows.last_mut() {
            Some(row) if row.0 == t => {
                if failed {
                    row.1 += q;
                } else {
                    row.2 += q;
                }
            }
            _ => rows.push(if failed { (t, q, 0) } else { (t, 0, q) }),
        }
    }
    rows
}

/// Log-log bounds on S(t): `S^exp(±z √V / ln S)` with `V` the Greenwood sum.
fn survival_bounds(s: f64, greenwood: f64, z: f64) -> Bounded {
    if s <= 0.0 || s >= 1.0 {
        return Bounded::exact(s);
    }
    let theta = (z * greenwood.sqrt() / s.ln()).exp();
    let theta = finite_or_zero(theta, "kaplan_meier.theta");
    if theta == 0.0 {
        return Bounded::exact(s);
    }
    Bounded::new(s.powf(theta), s, s.powf(1.0 / theta))
}

/// Kaplan–Meier estimate with Greenwood log-log bounds.
///
/// Events and suspensions at the same time are ordered events first, so a
/// unit suspended at `t` is still at risk for failures at `t`.
pub fn kaplan_meier(records: &[&FailureRecord], z: f64) -> KaplanMeierResult {
    let rows = tabulate(records);
    let mut at_risk: u32 = rows.iter().map(|r| r.1 + r.2).sum();
    let mut s = 1.0;
    let mut greenwood = 0.0;
    let mut points = Vec::new();

    for (t, d, c) in rows {
        if d > 0 && at_risk > 0 {
            let n = at_risk as f64;
            let df = d as f64;
            s *= 1.0 - df / n;
            greenwood += if at_risk > d {
                df / (n * (n - df))
            } else {
                0.0
            };
            let survival = survival_bounds(s, greenwood, z);
            let cumulative_hazard = survival.map(|v| finite_or_zero(-v.ln(), "cumulative_hazard"));
            let hazard = cumulative_hazard.map(|h| ratio_or_zero(h, t, "hazard"));
            let log_cumulative_hazard =
                cumulative_hazard.map(|h| if h > 0.0 { h.ln() } else { 0.0 });
            points.push(KaplanMeierPoint {
                time: t,
                at_risk,
                failures: d,
                survival,
                hazard,
                cumulative_hazard,
                log_cumulative_hazard,
            });
        }
        at_risk = at_risk.saturating_sub(d + c);
    }

    let mean = restricted_mean(&points, z);
    KaplanMeierResult { points, mean }
}

/// Area under the step curve from zero to the last failure time, with the
/// usual variance `Σ Aᵢ² dᵢ / (nᵢ (nᵢ − dᵢ))`, `Aᵢ` being the area beyond `tᵢ`.
fn restricted_mean(points: &[KaplanMeierPoint], z: f64) -> Bounded {
    if points.is_empty() {
        return Bounded::exact(0.0);
    }
    let mut area = 0.0;
    let mut prev_t = 0.0;
    let mut prev_s = 1.0;
    for p in points {
        area += prev_s * (p.time - prev_t);
        prev_t = p.time;
        prev_s = p.survival.point;
    }

    let mut variance = 0.0;
    let mut tail = 0.0;
    for i in (0..points.len()).rev() {
        if i + 1 < points.len() {
            tail += points[i].survival.point * (points[i + 1].time - points[i].time);
        }
        let n = points[i].at_risk as f64;
        let d = points[i].failures as f64;
        if n > d {
            variance += tail * tail * d / (n * (n - d));
        }
    }
    let sd = variance.sqrt();
    Bounded::new((area - z * sd).max(0.0), area, area + z * sd)
}
