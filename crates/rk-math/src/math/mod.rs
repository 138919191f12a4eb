//! Core math modules.

pub mod beta;
pub mod chi2;
pub mod gamma;
pub mod normal;
pub mod optimize;
pub mod regression;
pub mod stable;
pub mod student_t;
