//! Geometric-health predicates.
//!
//! Each predicate returns every violation it finds as a [`Finding`]; an
//! empty list means the geometry passed. Callers decide which predicates
//! apply to which operand.

pub mod geometry;
pub mod spatial;
pub mod types;

pub use geometry::{
    curve_degeneracy, curve_domain, finite_points, generic_curve_degeneracy, nurbs_geometry,
    plane_degeneracy, ray_degeneracy, surface_degeneracy, surface_domain,
};
pub use spatial::{brep_degeneracy, brep_topology, mesh_checks};
pub use types::{ErrorCode, Finding};
