//! ramkit core library
//!
//! Reliability engineering calculations:
//! - Survival and reliability-growth analysis
//! - Component hazard-rate prediction and hardware rollup
//! - Reliability allocation
//! - FMEA criticality and risk priority numbers
//!
//! The binary entry point is in `main.rs`.

pub mod allocation;
pub mod context;
pub mod degraded;
pub mod exit_codes;
pub mod expr;
pub mod fmea;
pub mod hardware;
pub mod logging;
pub mod prediction;
pub mod survival;

pub use context::CalculationContext;
