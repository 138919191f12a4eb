//! Nelson's mean cumulative function for repairable units.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::bounds::Bounded;
use super::record::{FailureRecord, RecordStatus};

/// One MCF estimate at a distinct event time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct McfPoint {
    pub time: f64,
    /// Events at exactly this time.
    pub failures: u32,
    /// Units still at risk at this time.
    pub at_risk: u32,
    pub mcf: Bounded,
}

#[derive(Debug, Default)]
struct UnitHistory {
    events: Vec<(f64, u32)>,
    censored_at: Option<f64>,
}

/// Nelson's estimate with log-transformed bounds at each distinct event time.
///
/// A unit stays in the risk set through its latest right-censoring time; a
/// unit without one stays at risk throughout. The variance is the Poisson
/// form `Σ d / r²`.
pub fn mean_cumulative_function(records: &[&FailureRecord], z: f64) -> Vec<McfPoint> {
    let mut units: BTreeMap<&str, UnitHistory> = BTreeMap::new();
    for r in records {
        let unit = units.entry(r.unit.as_str()).or_default();
        match r.status {
            RecordStatus::RightCensored => {
                unit.censored_at = Some(unit.censored_at.map_or(r.right, |c| c.max(r.right)));
            }
            _ => unit.events.push((r.point_time(), r.quantity)),
        }
    }

    let mut event_counts: BTreeMap<u64, (f64, u32)> = BTreeMap::new();
    for unit in units.values() {
        for &(t, q) in &unit.events {
            let entry = event_counts.entry(t.to_bits()).or_insert((t, 0));
            entry.1 += q;
        }
    }
    let mut times: Vec<(f64, u32)> = event_counts.into_values().collect();
    times.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut mu = 0.0;
    let mut var = 0.0;
    let mut out = Vec::with_capacity(times.len());
    for (t, d) in times {
        let at_risk = units
            .values()
            .filter(|u| u.censored_at.is_none_or(|c| c >= t))
            .count() as u32;
        if at_risk == 0 {
            continue;
        }
        let r = at_risk as f64;
        mu += d as f64 / r;
        var += d as f64 / (r * r);
        out.push(McfPoint {
            time: t,
            failures: d,
            at_risk,
            mcf: Bounded::log_transform(mu, var, z, "mcf"),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(records: &[FailureRecord]) -> Vec<&FailureRecord> {
        records.iter().collect()
    }

    #[test]
    fn first_failure_only_gives_events_over_units() {
        let records = vec![
            FailureRecord::event("a", 10.0),
            FailureRecord::event("b", 20.0),
            FailureRecord::event("c", 30.0),
            FailureRecord::event("d", 40.0),
        ];
        let mcf = mean_cumulative_function(&refs(&records), 1.15);
        let last = mcf.last().unwrap();
        assert!((last.mcf.point - 4.0 / 4.0).abs() < 1e-12);
        assert_eq!(last.at_risk, 4);
    }

    #[test]
    fn censored_units_leave_risk_set() {
        let records = vec![
            FailureRecord::event("a", 5.0),
            FailureRecord::censored("a", 50.0),
            FailureRecord::event("b", 8.0),
            FailureRecord::censored("b", 10.0),
            FailureRecord::event("a", 20.0),
        ];
        let mcf = mean_cumulative_function(&refs(&records), 1.0);
        assert_eq!(mcf.len(), 3);
        assert!((mcf[0].mcf.point - 0.5).abs() < 1e-12);
        assert!((mcf[1].mcf.point - 1.0).abs() < 1e-12);
        // b censored at 10, only a remains at 20
        assert_eq!(mcf[2].at_risk, 1);
        assert!((mcf[2].mcf.point - 2.0).abs() < 1e-12);
    }

    #[test]
    fn bounds_are_ordered_and_grow() {
        let records: Vec<FailureRecord> = (1..=10)
            .map(|i| FailureRecord::event(format!("u{}", i % 3), i as f64 * 3.0))
            .collect();
        let mcf = mean_cumulative_function(&refs(&records), 1.5);
        for p in &mcf {
            assert!(p.mcf.is_ordered());
        }
        assert!(mcf.windows(2).all(|w| w[0].mcf.point <= w[1].mcf.point));
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(mean_cumulative_function(&[], 1.0).is_empty());
    }
}
