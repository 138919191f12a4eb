//! Degenerate-result substitution.
//!
//! A division by a quantity that can legitimately be zero (an MTBF from a
//! zero hazard rate, a bound multiplier from zero variance) does not raise.
//! The helpers here substitute the documented fallback and log a
//! `result.degraded` warning naming the quantity.

use crate::logging::event_names;

fn warn_degraded(quantity: &str, fallback: f64) {
    tracing::warn!(
        event = event_names::RESULT_DEGRADED,
        quantity = quantity,
        fallback = fallback,
        "degenerate result substituted"
    );
}

/// `num / den`, or 0.0 when the quotient is not finite.
pub fn ratio_or_zero(num: f64, den: f64, quantity: &str) -> f64 {
    let value = num / den;
    if den == 0.0 || !value.is_finite() {
        warn_degraded(quantity, 0.0);
        0.0
    } else {
        value
    }
}

/// Mean time between failures from a hazard rate; 0.0 for a zero rate.
pub fn mtbf_from_rate(rate: f64) -> f64 {
    ratio_or_zero(1.0, rate, "mtbf")
}

/// Passes a probability through, or substitutes 1.0 when it is not finite.
///
/// Used for reliability and availability, whose neutral value is 1.0.
pub fn probability_or_one(value: f64, quantity: &str) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn_degraded(quantity, 1.0);
        1.0
    }
}

/// Passes a value through, or substitutes 0.0 when it is not finite.
pub fn finite_or_zero(value: f64, quantity: &str) -> f64 {
    if value.is_finite() {
        value
    } else {
        warn_degraded(quantity, 0.0);
        0.0
    }
}
