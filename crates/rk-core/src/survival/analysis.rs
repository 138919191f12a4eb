//! Survival analysis entry point: dispatch a [`Dataset`] to its model.

use rk_common::{Distribution, Result, RunId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::bounds::Bounded;
use super::growth::growth_observations;
use super::kaplan_meier::{kaplan_meier, KaplanMeierResult};
use super::loglinear::{log_linear, LogLinearResult};
use super::mcf::{mean_cumulative_function, McfPoint};
use super::parametric::{fit, FitResult};
use super::power_law::{power_law, BootstrapSettings, PowerLawResult};
use super::record::{
    consolidate, count_outcomes, interarrival_times, AnalysisOptions, Dataset, FailureRecord,
};
use super::trend::{trend_tests, TrendTests};
use crate::context::CalculationContext;
use crate::degraded::ratio_or_zero;
use crate::log_event;
use crate::logging::{event_names, Stage};

/// Model-specific output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelResult {
    Mcf {
        points: Vec<McfPoint>,
        trend_tests: TrendTests,
    },
    KaplanMeier(KaplanMeierResult),
    PowerLaw(PowerLawResult),
    LogLinear(LogLinearResult),
    Parametric(FitResult),
}

/// How much of the record quantity one child assembly accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    /// At least 10% of the quantity.
    Major,
    /// At least 5%.
    Moderate,
    /// At least 1%.
    Minor,
    Negligible,
}

impl Significance {
    pub fn from_share(share: f64) -> Self {
        if share >= 0.10 {
            Significance::Major
        } else if share >= 0.05 {
            Significance::Moderate
        } else if share >= 0.01 {
            Significance::Minor
        } else {
            Significance::Negligible
        }
    }
}

/// The fitted MTBF apportioned to one child assembly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssemblyShare {
    pub assembly_id: u32,
    pub quantity: u64,
    pub share: f64,
    pub mtbf: Bounded,
    pub hazard_rate: Bounded,
    pub significance: Significance,
}

/// Everything one survival run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalResult {
    pub run_id: RunId,
    pub distribution: Distribution,
    pub options: AnalysisOptions,
    pub n_failures: u32,
    pub n_suspensions: u32,
    pub mtbf: Bounded,
    pub hazard_rate: Bounded,
    pub model: ModelResult,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_assembly: Vec<AssemblyShare>,
}

/// Apportion `mtbf` over child assemblies by record quantity.
pub fn assembly_shares(records: &[&FailureRecord], mtbf: Bounded) -> Vec<AssemblyShare> {
    let total: u64 = records.iter().map(|r| u64::from(r.quantity)).sum();
    let mut by_id: BTreeMap<u32, u64> = BTreeMap::new();
    for r in records {
        if let Some(id) = r.assembly_id {
            *by_id.entry(id).or_default() += u64::from(r.quantity);
        }
    }
    let total = total as f64;
    by_id
        .into_iter()
        .map(|(assembly_id, quantity)| {
            let q = quantity as f64;
            let share = ratio_or_zero(q, total, "assembly_share");
            AssemblyShare {
                assembly_id,
                quantity,
                share,
                mtbf: mtbf.map(|m| ratio_or_zero(m * total, q, "assembly_mtbf")),
                hazard_rate: mtbf.map(|m| ratio_or_zero(q, m * total, "assembly_hazard_rate")),
                significance: Significance::from_share(share),
            }
        })
        .collect()
}

/// MTBF implied by the last MCF point: `t / μ̂(t)`.
fn mcf_mtbf(points: &[McfPoint]) -> Bounded {
    match points.last() {
        Some(p) => p.mcf.map(|m| ratio_or_zero(p.time, m, "mcf_mtbf")),
        None => Bounded::exact(0.0),
    }
}

/// Interarrival gaps of the failure records, per unit in arrival order.
fn failure_gaps(records: &[&FailureRecord]) -> Vec<f64> {
    let failures: Vec<FailureRecord> = records
        .iter()
        .filter(|r| r.status.is_failure())
        .map(|r| (*r).clone())
        .collect();
    interarrival_times(&failures)
        .into_iter()
        .map(|i| i.time_between)
        .collect()
}

/// Run the analysis the dataset asks for.
///
/// Windowed records are consolidated before any estimator sees them.
pub fn analyze(dataset: &Dataset, ctx: &CalculationContext) -> Result<SurvivalResult> {
    let opts = dataset.options(&ctx.config.analysis)?;
    let window: Vec<FailureRecord> = dataset.filtered_records().into_iter().cloned().collect();
    let mut consolidated = consolidate(&window);
    consolidated.sort_by(|a, b| a.right.total_cmp(&b.right));
    let records: Vec<&FailureRecord> = consolidated.iter().collect();
    let (n_failures, n_suspensions) = count_outcomes(&records);
    let distribution = dataset.distribution;
    let name = distribution.to_string();
    let stage = match distribution {
        Distribution::PowerLaw | Distribution::LogLinear => Stage::Growth,
        _ => Stage::Survival,
    };

    log_event!(
        ctx.log,
        INFO,
        event_names::ANALYSIS_STARTED,
        stage,
        "survival analysis started",
        distribution = name.as_str(),
        records = records.len(),
        confidence = opts.confidence
    );

    let z = opts.z();
    let (model, mtbf) = match distribution {
        Distribution::Mcf => {
            let points = mean_cumulative_function(&records, z);
            let mut times: Vec<f64> = records
                .iter()
                .filter(|r| r.status.is_failure())
                .flat_map(|r| std::iter::repeat_n(r.point_time(), r.quantity as usize))
                .collect();
            times.sort_by(f64::total_cmp);
            let end = dataset
                .end_time
                .or_else(|| records.iter().map(|r| r.right).reduce(f64::max))
                .unwrap_or(0.0);
            let mtbf = mcf_mtbf(&points);
            let gaps = failure_gaps(&records);
            let trend_tests = trend_tests(&times, &gaps, end, opts.confidence);
            (ModelResult::Mcf { points, trend_tests }, mtbf)
        }
        Distribution::KaplanMeier => {
            let km = kaplan_meier(&records, z);
            let mtbf = km.mean;
            (ModelResult::KaplanMeier(km), mtbf)
        }
        Distribution::PowerLaw => {
            let obs = growth_observations(dataset.cumulative.as_deref(), &records);
            let boot = BootstrapSettings {
                samples: ctx.config.analysis.bootstrap_samples,
                seed: ctx.config.analysis.bootstrap_seed,
            };
            let res = power_law(&obs, dataset.end_time, &opts, boot)?;
            let mtbf = res
                .rows
                .last()
                .map_or(Bounded::exact(0.0), |r| r.instantaneous_mtbf);
            (ModelResult::PowerLaw(res), mtbf)
        }
        Distribution::LogLinear => {
            let obs = growth_observations(dataset.cumulative.as_deref(), &records);
            let res = log_linear(&obs, dataset.end_time, &opts, ctx.solver_options())?;
            let mtbf = res
                .rows
                .last()
                .map_or(Bounded::exact(0.0), |r| r.instantaneous_mtbf);
            (ModelResult::LogLinear(res), mtbf)
        }
        Distribution::Exponential
        | Distribution::Lognormal
        | Distribution::Normal
        | Distribution::Weibull => {
            let res = fit(distribution, &records, &opts, ctx)?;
            let mtbf = res.mtbf;
            (ModelResult::Parametric(res), mtbf)
        }
    };

    let hazard_rate = mtbf.reciprocal("hazard_rate");
    let by_assembly = assembly_shares(&records, mtbf);

    log_event!(
        ctx.log,
        INFO,
        event_names::ANALYSIS_FINISHED,
        stage,
        "survival analysis finished",
        distribution = name.as_str(),
        failures = n_failures,
        mtbf = mtbf.point
    );

    Ok(SurvivalResult {
        run_id: ctx.log.run_id.clone(),
        distribution,
        options: opts,
        n_failures,
        n_suspensions,
        mtbf,
        hazard_rate,
        model,
        by_assembly,
    })
}
