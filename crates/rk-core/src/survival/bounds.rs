//! Point estimates with confidence bounds.

use serde::{Deserialize, Serialize};

use crate::degraded::{finite_or_zero, ratio_or_zero};

/// A `[lower, point, upper]` triplet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounded {
    pub lower: f64,
    pub point: f64,
    pub upper: f64,
}

impl Bounded {
    /// Build from two bound candidates in either order.
    pub fn new(a: f64, point: f64, b: f64) -> Self {
        Self {
            lower: a.min(b),
            point,
            upper: a.max(b),
        }
    }

    /// An estimate without uncertainty.
    pub fn exact(point: f64) -> Self {
        Self {
            lower: point,
            point,
            upper: point,
        }
    }

    /// Log-transform bounds for a positive, scale-type parameter:
    /// `estimate * exp(±z * sqrt(variance) / estimate)`.
    ///
    /// A zero estimate or unusable variance yields a zero-width interval.
    pub fn log_transform(estimate: f64, variance: f64, z: f64, quantity: &str) -> Self {
        let sd = finite_or_zero(variance.max(0.0).sqrt(), quantity);
        let spread = ratio_or_zero(z * sd, estimate, quantity);
        Self::new(
            estimate * (-spread).exp(),
            estimate,
            estimate * spread.exp(),
        )
    }

    /// Symmetric bounds for a location parameter: `estimate ± z * sqrt(variance)`.
    pub fn symmetric(estimate: f64, variance: f64, z: f64, quantity: &str) -> Self {
        let sd = finite_or_zero(variance.max(0.0).sqrt(), quantity);
        Self::new(estimate - z * sd, estimate, estimate + z * sd)
    }

    /// Apply a monotone function to all three values, reordering bounds.
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.lower), f(self.point), f(self.upper))
    }

    /// Reciprocal of each value; zeros map to 0.0 and are logged.
    pub fn reciprocal(self, quantity: &str) -> Self {
        self.map(|x| ratio_or_zero(1.0, x, quantity))
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.lower, self.point, self.upper]
    }

    /// Whether `lower <= point <= upper`.
    pub fn is_ordered(&self) -> bool {
        self.lower <= self.point && self.point <= self.upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_transform_brackets_estimate() {
        let b = Bounded::log_transform(100.0, 400.0, 1.96, "scale");
        assert!(b.is_ordered());
        assert!((b.lower - 100.0 * (-0.392f64).exp()).abs() < 1e-9);
        assert!((b.upper - 100.0 * 0.392f64.exp()).abs() < 1e-9);
    }

    #[test]
    fn negative_z_still_ordered() {
        let b = Bounded::log_transform(10.0, 4.0, -0.5, "scale");
        assert!(b.is_ordered());
        let s = Bounded::symmetric(10.0, 4.0, -0.5, "location");
        assert!(s.is_ordered());
    }

    #[test]
    fn zero_estimate_collapses() {
        let b = Bounded::log_transform(0.0, 4.0, 1.0, "scale");
        assert_eq!(b, Bounded::exact(0.0));
    }

    #[test]
    fn reciprocal_swaps_bounds() {
        let b = Bounded::new(2.0, 4.0, 8.0).reciprocal("rate");
        assert_eq!(b, Bounded::new(0.125, 0.25, 0.5));
    }
}
