//! Explicit calculation context.
//!
//! Every engine entry point takes a `&CalculationContext` instead of reading
//! process-wide state, so two calculations with different configurations can
//! run side by side.

use rk_config::{Config, HandbookTables};
use rk_math::optimize::SolverOptions;

use crate::logging::LogContext;

/// Configuration and log correlation for one calculation run.
#[derive(Debug, Clone, Default)]
pub struct CalculationContext {
    pub config: Config,
    pub log: LogContext,
}

impl CalculationContext {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            log: LogContext::default(),
        }
    }

    pub fn tables(&self) -> &HandbookTables {
        &self.config.tables
    }

    /// Solver settings from the analysis configuration.
    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            tolerance: self.config.analysis.solver_tolerance,
            max_iterations: self.config.analysis.max_iterations,
        }
    }

    /// Divisor converting handbook rates to per-hour rates.
    pub fn rate_multiplier(&self) -> f64 {
        self.config.prediction.rate_multiplier
    }
}
