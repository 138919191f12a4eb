//! ramkit math utilities.

pub mod math;

pub use math::beta::*;
pub use math::chi2::*;
pub use math::gamma::*;
pub use math::normal::*;
pub use math::optimize;
pub use math::regression::{self, LinearFit};
pub use math::stable::*;
pub use math::student_t::*;
