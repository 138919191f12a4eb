//! Failure records, datasets and record-level preprocessing.

use chrono::NaiveDate;
use rk_common::{ConfidenceMethod, ConfidenceType, Distribution, Error, FitMethod, Result};
use rk_config::AnalysisSettings;
use serde::{Deserialize, Serialize};

/// How a record's time is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Failure observed at `right`.
    Event,
    /// Still running at `right`.
    RightCensored,
    /// Failed at some time before `right`.
    LeftCensored,
    /// Failed somewhere in `(left, right]`.
    IntervalCensored,
}

impl RecordStatus {
    /// Whether the record counts as a failure.
    pub fn is_failure(self) -> bool {
        !matches!(self, RecordStatus::RightCensored)
    }
}

/// One observation of one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub unit: String,
    #[serde(default)]
    pub left: f64,
    pub right: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub status: RecordStatus,
    /// Request or ship date, used by the date window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Child assembly the unit belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly_id: Option<u32>,
}

fn default_quantity() -> u32 {
    1
}

/// Largest total record quantity a dataset may carry. Estimators expand
/// quantities into individual units.
pub const MAX_TOTAL_QUANTITY: u64 = 10_000_000;

impl FailureRecord {
    /// An exact failure at `time`.
    pub fn event(unit: impl Into<String>, time: f64) -> Self {
        Self {
            unit: unit.into(),
            left: time,
            right: time,
            quantity: 1,
            status: RecordStatus::Event,
            date: None,
            assembly_id: None,
        }
    }

    /// A suspension at `time`.
    pub fn censored(unit: impl Into<String>, time: f64) -> Self {
        Self {
            status: RecordStatus::RightCensored,
            ..Self::event(unit, time)
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_assembly(mut self, assembly_id: u32) -> Self {
        self.assembly_id = Some(assembly_id);
        self
    }

    /// Representative failure time for estimators that need a point.
    ///
    /// Interval-censored records use the interval midpoint.
    pub fn point_time(&self) -> f64 {
        match self.status {
            RecordStatus::IntervalCensored if self.right > self.left => {
                0.5 * (self.left + self.right)
            }
            _ => self.right,
        }
    }
}

/// Pre-aggregated growth observation: failures seen by a cumulative test time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthObservation {
    pub cumulative_time: f64,
    pub failures: u32,
}

/// A survival dataset. Unset methods fall back to the analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub description: String,
    pub distribution: Distribution,
    #[serde(default)]
    pub fit_method: Option<FitMethod>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub confidence_type: Option<ConfidenceType>,
    #[serde(default)]
    pub confidence_method: Option<ConfidenceMethod>,
    #[serde(default)]
    pub start_time: f64,
    /// Window end; `None` keeps every record past `start_time`.
    #[serde(default)]
    pub end_time: Option<f64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub records: Vec<FailureRecord>,
    /// Cumulative counts for the growth models, used instead of `records`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative: Option<Vec<GrowthObservation>>,
}

/// Fully resolved analysis options for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub fit_method: FitMethod,
    pub confidence: f64,
    pub confidence_type: ConfidenceType,
    pub confidence_method: ConfidenceMethod,
}

impl AnalysisOptions {
    /// Probability level of the bound quantile.
    pub fn bound_level(&self) -> f64 {
        match self.confidence_type {
            ConfidenceType::TwoSided => (1.0 + self.confidence) / 2.0,
            ConfidenceType::LowerOneSided | ConfidenceType::UpperOneSided => self.confidence,
        }
    }

    /// Standard-normal quantile at [`bound_level`](Self::bound_level).
    pub fn z(&self) -> f64 {
        rk_math::normal_ppf(self.bound_level())
    }
}

impl Dataset {
    pub fn new(distribution: Distribution) -> Self {
        Self {
            description: String::new(),
            distribution,
            fit_method: None,
            confidence: None,
            confidence_type: None,
            confidence_method: None,
            start_time: 0.0,
            end_time: None,
            start_date: None,
            end_date: None,
            records: Vec::new(),
            cumulative: None,
        }
    }

    pub fn with_records(mut self, records: Vec<FailureRecord>) -> Self {
        self.records = records;
        self
    }

    /// Check dataset invariants and resolve methods against `settings`.
    pub fn options(&self, settings: &AnalysisSettings) -> Result<AnalysisOptions> {
        let confidence = self.confidence.unwrap_or(settings.confidence);
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(Error::invalid(
                "confidence",
                format!("must be in (0, 1), got {}", confidence),
            ));
        }
        if !(self.start_time >= 0.0) {
            return Err(Error::invalid(
                "start_time",
                format!("must be non-negative, got {}", self.start_time),
            ));
        }
        if let Some(end) = self.end_time {
            if end < self.start_time {
                return Err(Error::invalid(
                    "end_time",
                    format!("{} is before start_time {}", end, self.start_time),
                ));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(Error::invalid(
                    "end_date",
                    format!("{} is before start_date {}", end, start),
                ));
            }
        }
        for (i, r) in self.records.iter().enumerate() {
            if !(r.left >= 0.0 && r.right >= 0.0) {
                return Err(Error::invalid(
                    format!("records[{}]", i),
                    "record times must be non-negative",
                ));
            }
            if r.status == RecordStatus::IntervalCensored && r.left > r.right {
                return Err(Error::invalid(
                    format!("records[{}]", i),
                    format!("interval ({}, {}] is reversed", r.left, r.right),
                ));
            }
        }
        let total: u64 = self.records.iter().map(|r| u64::from(r.quantity)).sum();
        if total > MAX_TOTAL_QUANTITY {
            return Err(Error::invalid(
                "records",
                format!(
                    "total quantity {} exceeds the limit of {}",
                    total, MAX_TOTAL_QUANTITY
                ),
            ));
        }
        if let Some(obs) = &self.cumulative {
            let failures: u64 = obs.iter().map(|o| u64::from(o.failures)).sum();
            if failures > MAX_TOTAL_QUANTITY {
                return Err(Error::invalid(
                    "cumulative",
                    format!(
                        "total failures {} exceed the limit of {}",
                        failures, MAX_TOTAL_QUANTITY
                    ),
                ));
            }
            if obs.iter().any(|o| !(o.cumulative_time >= 0.0)) {
                return Err(Error::invalid(
                    "cumulative",
                    "cumulative test times must be non-negative",
                ));
            }
        }

        Ok(AnalysisOptions {
            fit_method: self.fit_method.unwrap_or(settings.fit_method),
            confidence,
            confidence_type: self.confidence_type.unwrap_or(settings.confidence_type),
            confidence_method: self.confidence_method.unwrap_or(settings.confidence_method),
        })
    }

    /// Records inside the time and date window, ordered by time.
    ///
    /// The time window is `start_time < right <= end_time`; the date window
    /// is `start_date <= date < end_date`. Undated records always pass the
    /// date window.
    pub fn filtered_records(&self) -> Vec<&FailureRecord> {
        let end = self.end_time.unwrap_or(f64::INFINITY);
        let mut out: Vec<&FailureRecord> = self
            .records
            .iter()
            .filter(|r| r.right > self.start_time && r.right <= end)
            .filter(|r| match (r.date, self.start_date) {
                (Some(d), Some(s)) => d >= s,
                _ => true,
            })
            .filter(|r| match (r.date, self.end_date) {
                (Some(d), Some(e)) => d < e,
                _ => true,
            })
            .collect();
        out.sort_by(|a, b| a.right.total_cmp(&b.right));
        out
    }
}

/// Time between a record and the previous record of the same unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interarrival {
    pub unit: String,
    pub left: f64,
    pub right: f64,
    pub time_between: f64,
}

/// Interarrival times, with records ordered by unit then left interval.
///
/// A unit's first record measures from time zero.
pub fn interarrival_times(records: &[FailureRecord]) -> Vec<Interarrival> {
    let mut sorted: Vec<&FailureRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.unit.cmp(&b.unit).then(a.left.total_cmp(&b.left)));

    let mut out = Vec::with_capacity(sorted.len());
    let mut prev: Option<&FailureRecord> = None;
    for r in sorted {
        let time_between = match prev {
            Some(p) if p.unit == r.unit => r.right - p.right,
            _ => r.right,
        };
        out.push(Interarrival {
            unit: r.unit.clone(),
            left: r.left,
            right: r.right,
            time_between,
        });
        prev = Some(r);
    }
    out
}

/// Merge records with identical unit, interval and status by summing quantity.
///
/// The result is ordered by unit, left, right, then status.
pub fn consolidate(records: &[FailureRecord]) -> Vec<FailureRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        a.unit
            .cmp(&b.unit)
            .then(a.left.total_cmp(&b.left))
            .then(a.right.total_cmp(&b.right))
            .then(a.status.cmp(&b.status))
    });

    let mut out: Vec<FailureRecord> = Vec::with_capacity(sorted.len());
    for r in sorted {
        match out.last_mut() {
            Some(last)
                if last.unit == r.unit
                    && last.left == r.left
                    && last.right == r.right
                    && last.status == r.status =>
            {
                last.quantity = last.quantity.saturating_add(r.quantity);
            }
            _ => out.push(r),
        }
    }
    out
}

/// Failure and suspension counts, weighted by quantity.
pub fn count_outcomes(records: &[&FailureRecord]) -> (u32, u32) {
    records.iter().fold((0, 0), |(f, s), r| {
        if r.status.is_failure() {
            (f + r.quantity, s)
        } else {
            (f, s + r.quantity)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_fall_back_to_settings() {
        let ds = Dataset::new(Distribution::Weibull);
        let opts = ds.options(&AnalysisSettings::default()).unwrap();
        assert_eq!(opts.confidence, 0.75);
        assert_eq!(opts.fit_method, FitMethod::Mle);
        assert!((opts.bound_level() - 0.875).abs() < 1e-12);
    }

    #[test]
    fn options_reject_bad_confidence_and_window() {
        let settings = AnalysisSettings::default();
        let mut ds = Dataset::new(Distribution::Exponential);
        ds.confidence = Some(1.0);
        assert_eq!(ds.options(&settings).unwrap_err().code(), 10);

        let mut ds = Dataset::new(Distribution::Exponential);
        ds.start_time = 10.0;
        ds.end_time = Some(5.0);
        assert!(ds.options(&settings).is_err());

        let ds = Dataset::new(Distribution::Exponential)
            .with_records(vec![FailureRecord::event("a", -1.0)]);
        assert!(ds.options(&settings).is_err());
    }

    #[test]
    fn options_reject_absurd_quantity() {
        let settings = AnalysisSettings::default();
        let ds = Dataset::new(Distribution::Weibull)
            .with_records(vec![FailureRecord::event("a", 5.0).with_quantity(u32::MAX)]);
        let err = ds.options(&settings).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { ref field, .. } if field == "records"));

        // the limit applies to the sum, not each record
        let ds = Dataset::new(Distribution::Weibull).with_records(vec![
            FailureRecord::event("a", 5.0).with_quantity(6_000_000),
            FailureRecord::event("b", 9.0).with_quantity(6_000_000),
        ]);
        assert!(ds.options(&settings).is_err());

        let ds = Dataset::new(Distribution::Weibull)
            .with_records(vec![FailureRecord::event("a", 5.0).with_quantity(1_000)]);
        assert!(ds.options(&settings).is_ok());
    }

    #[test]
    fn window_filters_on_right_interval() {
        let mut ds = Dataset::new(Distribution::Exponential).with_records(vec![
            FailureRecord::event("a", 5.0),
            FailureRecord::event("b", 10.0),
            FailureRecord::event("c", 15.0),
            FailureRecord::censored("d", 20.0),
        ]);
        ds.start_time = 5.0;
        ds.end_time = Some(15.0);
        let kept: Vec<f64> = ds.filtered_records().iter().map(|r| r.right).collect();
        assert_eq!(kept, vec![10.0, 15.0]);
    }

    #[test]
    fn date_window_is_half_open() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let mut a = FailureRecord::event("a", 1.0);
        a.date = Some(d("2024-01-01"));
        let mut b = FailureRecord::event("b", 2.0);
        b.date = Some(d("2024-02-01"));
        let mut ds = Dataset::new(Distribution::Exponential).with_records(vec![a, b]);
        ds.start_date = Some(d("2024-01-01"));
        ds.end_date = Some(d("2024-02-01"));
        assert_eq!(ds.filtered_records().len(), 1);
    }

    #[test]
    fn interarrival_restarts_per_unit() {
        let records = vec![
            FailureRecord::event("u2", 7.0),
            FailureRecord::event("u1", 10.0),
            FailureRecord::event("u1", 4.0),
            FailureRecord::event("u1", 25.0),
        ];
        let tbf: Vec<f64> = interarrival_times(&records)
            .iter()
            .map(|i| i.time_between)
            .collect();
        assert_eq!(tbf, vec![4.0, 6.0, 15.0, 7.0]);
    }

    #[test]
    fn consolidate_sums_duplicates() {
        let records = vec![
            FailureRecord::event("a", 5.0),
            FailureRecord::event("a", 5.0).with_quantity(2),
            FailureRecord::censored("a", 5.0),
            FailureRecord::event("b", 5.0),
        ];
        let merged = consolidate(&records);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].quantity, 3);
        assert_eq!(merged[0].status, RecordStatus::Event);
        assert_eq!(merged[1].status, RecordStatus::RightCensored);
    }

    #[test]
    fn counts_weight_by_quantity() {
        let records = [
            FailureRecord::event("a", 1.0).with_quantity(3),
            FailureRecord::censored("b", 2.0).with_quantity(2),
        ];
        let refs: Vec<&FailureRecord> = records.iter().collect();
        assert_eq!(count_outcomes(&refs), (3, 2));
    }
}
