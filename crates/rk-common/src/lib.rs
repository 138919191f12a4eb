//! ramkit common types, IDs and errors.
//!
//! This crate provides foundational types shared across the ramkit crates:
//! - Hardware node and run identifiers
//! - Fit/confidence method vocabulary
//! - The unified error taxonomy

pub mod error;
pub mod id;
pub mod methods;

pub use error::{Error, Result};
pub use id::{NodeId, RunId};
pub use methods::{ConfidenceMethod, ConfidenceType, Distribution, FitMethod};
