//! Per-operand validation requirements and the composer that applies them
//! ahead of a strategy's computation.

use std::fmt;
use std::ops::BitOr;

use geo_kernel::Tolerance;
use geo_kernel::geometry::{Curve, Surface};
use geo_kernel::validation::{self, ErrorCode, Finding};
use tracing::debug;

use crate::context::FailurePolicy;
use crate::error::{Failure, IntersectError, Slot};
use crate::value::GeometryValue;

/// Set of health checks an operand must pass. [`ValidationRequirement::NONE`]
/// always passes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValidationRequirement(u16);

impl ValidationRequirement {
    pub const NONE: Self = Self(0);
    /// Zero-length, zero-radius or zero-direction geometry.
    pub const DEGENERACY: Self = Self(1 << 0);
    /// Closed-manifold B-rep topology.
    pub const TOPOLOGY: Self = Self(1 << 1);
    /// Knot, weight and control-point data of NURBS curves.
    pub const NURBS_GEOMETRY: Self = Self(1 << 2);
    /// Non-empty, finite parameter domains.
    pub const UV_DOMAIN: Self = Self(1 << 3);
    /// Triangle index and face-area checks.
    pub const MESH_SPECIFIC: Self = Self(1 << 4);
    /// Finite coordinates everywhere.
    pub const FINITE: Self = Self(1 << 5);

    const NAMED: [(Self, &'static str); 6] = [
        (Self::DEGENERACY, "Degeneracy"),
        (Self::TOPOLOGY, "Topology"),
        (Self::NURBS_GEOMETRY, "NurbsGeometry"),
        (Self::UV_DOMAIN, "UVDomain"),
        (Self::MESH_SPECIFIC, "MeshSpecific"),
        (Self::FINITE, "Finite"),
    ];

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// The single flags set in `self`, with their names, in declaration order.
    pub fn flags(self) -> impl Iterator<Item = (Self, &'static str)> {
        Self::NAMED.into_iter().filter(move |(f, _)| self.contains(*f))
    }
}

impl BitOr for ValidationRequirement {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Debug for ValidationRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("None");
        }
        let names: Vec<&str> = self.flags().map(|(_, n)| n).collect();
        f.write_str(&names.join("|"))
    }
}

/// Findings for one flag on one operand. Flags that do not apply to the
/// operand's kind yield nothing.
fn check_flag(value: &GeometryValue, flag: ValidationRequirement, tol: &Tolerance) -> Vec<Finding> {
    use crate::validate::ValidationRequirement as R;
    use GeometryValue as G;

    match flag {
        R::DEGENERACY => match value {
            G::Curve(c) => validation::curve_degeneracy(c, tol),
            G::Line(l) => validation::curve_degeneracy(&Curve::Line(*l), tol),
            G::Circle(c) => validation::curve_degeneracy(&Curve::Circle(*c), tol),
            G::Arc(a) => validation::curve_degeneracy(&Curve::Arc(*a), tol),
            G::UserCurve(c) => validation::generic_curve_degeneracy(c.as_ref(), tol),
            G::Surface(s) => validation::surface_degeneracy(s, tol),
            G::Sphere(s) => validation::surface_degeneracy(&Surface::Sphere(*s), tol),
            G::Cylinder(c) => validation::surface_degeneracy(&Surface::Cylinder(*c), tol),
            G::Plane(p) => validation::plane_degeneracy(p),
            G::Ray(r) => validation::ray_degeneracy(r),
            G::Brep(b) => validation::brep_degeneracy(b, tol),
            G::BoundingBox(bb) if !bb.is_valid() => vec![Finding::new(
                ErrorCode::EmptyGeometry,
                "bounding box has min above max",
            )],
            G::PointCloud(pts) if pts.is_empty() => {
                vec![Finding::new(ErrorCode::EmptyGeometry, "point cloud is empty")]
            }
            _ => Vec::new(),
        },
        R::TOPOLOGY => match value {
            G::Brep(b) => validation::brep_topology(b),
            _ => Vec::new(),
        },
        R::NURBS_GEOMETRY => match value {
            G::Curve(c) => validation::nurbs_geometry(c),
            _ => Vec::new(),
        },
        R::UV_DOMAIN => {
            if let Some(c) = value.as_curve() {
                validation::curve_domain(c)
            } else if let Some(s) = value.as_surface() {
                validation::surface_domain(s)
            } else {
                Vec::new()
            }
        }
        R::MESH_SPECIFIC => match value {
            G::Mesh(m) => validation::mesh_checks(m, tol),
            _ => Vec::new(),
        },
        R::FINITE => match value {
            G::Mesh(m) => validation::finite_points(&m.vertices),
            G::Brep(b) => validation::finite_points(&b.vertices),
            G::PointCloud(pts) => validation::finite_points(pts),
            G::BoundingBox(bb) => validation::finite_points([&bb.min, &bb.max]),
            G::Line(l) => validation::finite_points([&l.start, &l.end]),
            G::Ray(r) => validation::finite_points([&r.origin]),
            G::Plane(p) => validation::finite_points([&p.origin]),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Every violation of `requirement` on one operand, as engine errors.
pub fn validate_operand(
    value: &GeometryValue,
    requirement: ValidationRequirement,
    slot: Slot,
    tol: &Tolerance,
) -> Vec<IntersectError> {
    let mut errors = Vec::new();
    for (flag, name) in requirement.flags() {
        for finding in check_flag(value, flag, tol) {
            errors.push(IntersectError::ValidationFailed {
                slot,
                requirement: name,
                code: finding.code,
                message: finding.message,
            });
        }
    }
    errors
}

/// Gate a computation on both operands' requirements.
///
/// Under [`FailurePolicy::FailFast`] only the first violation is reported
/// and operand B is not inspected once A fails. Under
/// [`FailurePolicy::Accumulate`] both operands are checked independently and
/// every violation is reported.
pub fn compose(
    a: (&GeometryValue, ValidationRequirement),
    b: (&GeometryValue, ValidationRequirement),
    tol: &Tolerance,
    policy: FailurePolicy,
) -> Result<(), Failure> {
    let mut errors = Vec::new();
    for (slot, (value, requirement)) in [(Slot::A, a), (Slot::B, b)] {
        if requirement.is_none() {
            continue;
        }
        errors.extend(validate_operand(value, requirement, slot, tol));
        if policy == FailurePolicy::FailFast && !errors.is_empty() {
            errors.truncate(1);
            break;
        }
    }
    match Failure::from_errors(errors) {
        None => Ok(()),
        Some(failure) => {
            debug!(errors = failure.error_count(), "validation rejected operands");
            Err(failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_kernel::geometry::{Circle3d, Line3d, Plane, Point3d, Vec3};

    fn zero_line() -> GeometryValue {
        GeometryValue::Line(Line3d::new(Point3d::ORIGIN, Point3d::ORIGIN))
    }

    fn flat_plane() -> GeometryValue {
        GeometryValue::Plane(Plane::new(Point3d::ORIGIN, Vec3::ZERO))
    }

    #[test]
    fn test_flags_iterate_in_order() {
        let r = ValidationRequirement::FINITE | ValidationRequirement::DEGENERACY;
        let names: Vec<&str> = r.flags().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["Degeneracy", "Finite"]);
        assert_eq!(format!("{:?}", ValidationRequirement::NONE), "None");
    }

    #[test]
    fn test_none_requirement_skips_checks() {
        let tol = Tolerance::default();
        let none = ValidationRequirement::NONE;
        let composed = compose(
            (&zero_line(), none),
            (&flat_plane(), none),
            &tol,
            FailurePolicy::Accumulate,
        );
        assert!(composed.is_ok());
    }

    #[test]
    fn test_accumulate_checks_both_operands() {
        let tol = Tolerance::default();
        let d = ValidationRequirement::DEGENERACY;
        let err = compose((&zero_line(), d), (&flat_plane(), d), &tol, FailurePolicy::Accumulate)
            .unwrap_err();
        assert_eq!(err.error_count(), 2);
        assert!(matches!(err.errors()[0], IntersectError::ValidationFailed { slot: Slot::A, .. }));
        assert!(matches!(
            err.errors()[1],
            IntersectError::ValidationFailed {
                slot: Slot::B,
                code: ErrorCode::ZeroDirection,
                ..
            }
        ));
    }

    #[test]
    fn test_fail_fast_stops_at_first() {
        let tol = Tolerance::default();
        let d = ValidationRequirement::DEGENERACY;
        let err = compose((&zero_line(), d), (&flat_plane(), d), &tol, FailurePolicy::FailFast)
            .unwrap_err();
        assert_eq!(err.error_count(), 1);
    }

    #[test]
    fn test_healthy_circle_passes() {
        let circle = GeometryValue::Circle(Circle3d::new(Point3d::ORIGIN, Vec3::Z, 1.0));
        let r = ValidationRequirement::DEGENERACY | ValidationRequirement::UV_DOMAIN;
        assert!(validate_operand(&circle, r, Slot::A, &Tolerance::default()).is_empty());
    }
}
