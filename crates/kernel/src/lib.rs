//! Geometry kernel: value types, native intersection numerics and
//! geometric-health predicates.
//!
//! Every intersection routine in [`intersection`] is a pure function of its
//! operands and a [`Tolerance`]; none of them allocate shared state.

pub mod geometry;
pub mod intersection;
pub mod traits;
pub mod validation;

mod error;

pub use error::KernelError;
pub use traits::{ParametricCurve, ParametricSurface};

/// Tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Points closer than this are considered coincident (model units).
    pub coincidence: f64,
    /// Angles smaller than this (radians) are considered zero.
    pub angular: f64,
    /// Parameter-space tolerance for curve/surface evaluations.
    pub parametric: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-6,
            angular: 1e-10,
            parametric: 1e-9,
        }
    }
}

impl Tolerance {
    /// Default tolerance with a caller-chosen coincidence distance.
    pub fn with_coincidence(coincidence: f64) -> Self {
        Self {
            coincidence,
            ..Self::default()
        }
    }

    pub fn points_coincident(&self, a: &geometry::Point3d, b: &geometry::Point3d) -> bool {
        a.distance_to(b) <= self.coincidence
    }

    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }

    pub fn is_zero_angle(&self, angle: f64) -> bool {
        angle.abs() < self.angular
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::Point3d;

    #[test]
    fn test_tolerance_coincidence_is_inclusive() {
        let tol = Tolerance::with_coincidence(0.5);
        let a = Point3d::ORIGIN;
        let b = Point3d::new(0.5, 0.0, 0.0);
        assert!(tol.points_coincident(&a, &b));
        assert!(!tol.points_coincident(&a, &Point3d::new(0.51, 0.0, 0.0)));
    }

    #[test]
    fn test_tolerance_zero_checks() {
        let tol = Tolerance::default();
        assert!(tol.is_zero_length(1e-9));
        assert!(!tol.is_zero_length(1e-3));
        assert!(tol.is_zero_angle(1e-12));
    }
}
