//! Survival and reliability-growth analysis.
//!
//! Nonparametric estimators (MCF, Kaplan–Meier), NHPP growth models
//! (power law, log-linear), parametric life fits and growth planning.

pub mod analysis;
pub mod bounds;
pub mod growth;
pub mod kaplan_meier;
pub mod loglinear;
pub mod mcf;
pub mod parametric;
pub mod planning;
pub mod power_law;
pub mod record;
pub mod trend;

pub use analysis::{analyze, AssemblyShare, ModelResult, Significance, SurvivalResult};
pub use bounds::Bounded;
pub use record::{
    consolidate, interarrival_times, AnalysisOptions, Dataset, FailureRecord, GrowthObservation,
    Interarrival, RecordStatus,
};
